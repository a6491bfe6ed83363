use crate::application::site::{SiteError, SiteService};
use crate::domain::settings::{DEFAULT_TITLE, SitePreferences};

/// Values posted by the site settings form.
#[derive(Debug, Clone, Default)]
pub struct UpdateSiteCommand {
    pub title: String,
    pub description: String,
    pub template_text: String,
    pub use_own_template: bool,
}

#[derive(Clone)]
pub struct AdminSiteService {
    site: SiteService,
}

impl AdminSiteService {
    pub fn new(site: SiteService) -> Self {
        Self { site }
    }

    pub async fn load(&self) -> Result<SitePreferences, SiteError> {
        self.site.load().await
    }

    /// Apply the form to the stored preferences. The front page is kept.
    pub async fn update(&self, command: UpdateSiteCommand) -> Result<SitePreferences, SiteError> {
        let mut prefs = self.site.load().await?;

        prefs.title = if command.title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            command.title
        };
        prefs.description = command.description;
        prefs.template_text = (!command.template_text.is_empty()).then_some(command.template_text);
        prefs.template_default = !command.use_own_template;

        self.site.save(prefs.clone()).await?;
        Ok(prefs)
    }
}
