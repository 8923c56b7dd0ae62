use webbrowser::Browser;

use crate::stats::SessionResult;

const SHARE_ENDPOINT: &str = "https://twitter.com/intent/tweet?text=";

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("no browser available to share results")]
    NoBrowser,

    #[error("could not open browser: {0}")]
    Open(#[from] std::io::Error),
}

/// Speed / accuracy / time summary of a finished test
pub fn share_text(result: &SessionResult) -> String {
    format!(
        "I just completed a typing speed test! 🎯\n\n\
         ⚡ Speed: {} WPM\n\
         🎯 Accuracy: {}%\n\
         ⏱️ Time: {}s\n\n\
         Try it yourself with keypace!",
        result.wpm,
        result.accuracy,
        result.elapsed_display_secs()
    )
}

pub fn share_url(result: &SessionResult) -> String {
    format!("{SHARE_ENDPOINT}{}", encode_component(&share_text(result)))
}

// RFC 3986 unreserved characters pass through, every other byte is %XX
fn encode_component(text: &str) -> String {
    text.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Where the results screen sends a finished result
pub trait ResultSharer {
    fn share(&self, result: &SessionResult) -> Result<(), ShareError>;
}

/// Opens the share intent in the default browser
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserSharer;

impl ResultSharer for BrowserSharer {
    fn share(&self, result: &SessionResult) -> Result<(), ShareError> {
        if !Browser::is_available() {
            return Err(ShareError::NoBrowser);
        }
        webbrowser::open(&share_url(result))?;
        Ok(())
    }
}
