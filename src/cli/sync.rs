use crate::catalog::snapshot::SnapshotSource;
use crate::catalog::store::ReconcileOutcome;
use crate::cli::{GlobalArgs, OutputFormat};

pub fn run(global: &GlobalArgs) -> anyhow::Result<()> {
    let (pos, outcome) = global.open_session()?;

    match global.format {
        OutputFormat::Text | OutputFormat::Csv => {
            println!("{}", describe(&outcome, pos.source()));
            println!("Inventory: {} products", pos.catalog().len());
        }
        OutputFormat::Json => {
            let json = match &outcome {
                ReconcileOutcome::Skipped { reason } => serde_json::json!({
                    "applied": false,
                    "source": pos.source().to_string(),
                    "reason": reason.to_string(),
                    "product_count": pos.catalog().len(),
                }),
                ReconcileOutcome::Applied {
                    authoritative,
                    local_only,
                    persistence_error,
                } => serde_json::json!({
                    "applied": true,
                    "source": pos.source().to_string(),
                    "authoritative": authoritative,
                    "local_only": local_only,
                    "persisted": persistence_error.is_none(),
                    "product_count": pos.catalog().len(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

/// One-line summary of a reconciliation
pub fn describe(outcome: &ReconcileOutcome, source: &SnapshotSource) -> String {
    match outcome {
        ReconcileOutcome::Skipped { reason } => {
            format!("Catalog not refreshed from {source}: {reason}")
        }
        ReconcileOutcome::Applied {
            authoritative,
            local_only,
            persistence_error,
        } => {
            let mut line = format!(
                "Synced with {source}: {authoritative} products, {local_only} local-only"
            );
            if let Some(e) = persistence_error {
                line.push_str(&format!(" (not saved: {e})"));
            }
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::reconcile::SnapshotError;
    use crate::catalog::snapshot::FetchError;

    #[test]
    fn test_describe_outcomes() {
        let applied = ReconcileOutcome::Applied {
            authoritative: 10,
            local_only: 2,
            persistence_error: None,
        };
        assert_eq!(
            describe(&applied, &SnapshotSource::Embedded),
            "Synced with embedded catalog: 10 products, 2 local-only"
        );

        let skipped = ReconcileOutcome::Skipped {
            reason: SnapshotError::Fetch(FetchError::Status {
                url: "https://example.com/productos.json".to_string(),
                status: 404,
            }),
        };
        assert!(describe(&skipped, &SnapshotSource::Embedded).contains("404"));
    }
}
