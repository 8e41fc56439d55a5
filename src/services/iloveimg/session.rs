use super::types::SessionCredentials;
use crate::services::upscaler::UpscaleError;
use regex::Regex;

/// Pulls the bearer token and task id out of the iLoveIMG landing page.
pub struct SessionScraper {
    token: Regex,
    task_id: Regex,
}

impl SessionScraper {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token: Regex::new(r#""token":"([^"]+)""#)?,
            task_id: Regex::new(r#"ilovepdfConfig\.taskId\s*=\s*'([^']+)'"#)?,
        })
    }

    pub fn scrape(&self, html: &str) -> Result<SessionCredentials, UpscaleError> {
        let token = capture(&self.token, html);
        let task_id = capture(&self.task_id, html);

        match (token, task_id) {
            (Some(token), Some(task_id)) => Ok(SessionCredentials { token, task_id }),
            (None, _) => Err(UpscaleError::Session(
                "bearer token not found in landing page".to_string(),
            )),
            (_, None) => Err(UpscaleError::Session(
                "task id not found in landing page".to_string(),
            )),
        }
    }
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
