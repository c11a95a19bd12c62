//! Handler for the `status` command.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::application::{Coordinator, ServiceReport};
use crate::error::Result;

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&ServiceReport> for StatusRow {
    fn from(report: &ServiceReport) -> Self {
        Self {
            service: report.name.clone(),
            status: status_text(report),
        }
    }
}

fn status_text(report: &ServiceReport) -> String {
    match &report.status {
        Ok(status) => status.to_string(),
        Err(e) => format!("error: {e}"),
    }
}

/// Print one service, or a table of all of them.
pub async fn execute(coordinator: &mut Coordinator, service: Option<&str>) -> Result<()> {
    if let Some(name) = service {
        let status = coordinator.status_of(name).await?;
        if output::is_json() {
            output::json_output(json!({
                "command": "status",
                "service": name,
                "status": status.to_string(),
            }));
        } else {
            output::field(name, output::status(&status));
        }
        return Ok(());
    }

    let reports = coordinator.status_all().await?;
    if output::is_json() {
        let services: Vec<_> = reports
            .iter()
            .map(|report| json!({ "service": report.name, "status": status_text(report) }))
            .collect();
        output::json_output(json!({
            "command": "status",
            "network": coordinator.network().as_str(),
            "services": services,
        }));
        return Ok(());
    }

    let rows: Vec<StatusRow> = reports.iter().map(StatusRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;
    use crate::error::Error;

    #[test]
    fn rows_render_status_or_error() {
        let ready = ServiceReport {
            name: "proxy".into(),
            status: Ok(Status::Ready),
        };
        let broken = ServiceReport {
            name: "xud".into(),
            status: Err(Error::Connection("refused".into())),
        };
        let table = Table::new([StatusRow::from(&ready), StatusRow::from(&broken)]).to_string();

        assert!(table.contains("Service"));
        assert!(table.contains("Ready"));
        assert!(table.contains("error: connection error: refused"));
    }
}
