//! Contract with the external report transport.

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::report::ReportPayload;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipients {
    pub to: Vec<String>,
    pub cc: Vec<String>,
}

impl Recipients {
    pub fn is_empty(&self) -> bool {
        self.to.is_empty() && self.cc.is_empty()
    }
}

/// Delivers an assembled report. Transport failures are the caller's
/// problem to log; reconciliation results are never rolled back over a
/// failed send.
pub trait Notifier {
    fn send(
        &self,
        payload: &ReportPayload,
        recipients: &Recipients,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Prints the report instead of sending it. Used for dry runs and when no
/// real transport is configured.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, payload: &ReportPayload, recipients: &Recipients) -> Result<()> {
        info!(
            "Report '{}' (to: {}, cc: {})",
            payload.subject,
            recipients.to.join(", "),
            recipients.cc.join(", ")
        );
        info!("\n{}", payload.plain_body);
        Ok(())
    }
}
