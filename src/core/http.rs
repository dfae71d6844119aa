use std::time::Duration;

use reqwest::{
    Client,
    Response,
};

use crate::core::TankyuError;

pub fn http_client(timeout_secs: u64) -> Result<Client, TankyuError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent("tankyu/0.1 (+reqwest)")
        .build()
        .map_err(|e| TankyuError::Custom(format!("HTTP client build failed: {e}")))
}

pub fn ensure_success(resp: &Response) -> Result<(), TankyuError> {
    if !resp.status().is_success() {
        return Err(TankyuError::Search(format!(
            "HTTP error {} from {}",
            resp.status(),
            resp.url()
        )));
    }
    Ok(())
}
