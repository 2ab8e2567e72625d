use std::collections::HashSet;

use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::snapshot::FetchError;
use crate::codec::structured::decode_structured;
use crate::codec::FormatError;
use crate::core::catalog::Catalog;
use crate::core::types::ProductId;

/// Why the authoritative snapshot could not be used
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Authoritative snapshot is malformed: {0}")]
    Format(#[from] FormatError),
}

/// Merged startup catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub catalog: Catalog,
    /// Number of products taken from the authoritative snapshot
    pub authoritative: usize,
    /// Ids kept only because they exist in the local snapshot, in local order
    pub local_only: Vec<ProductId>,
}

/// Merge the authoritative catalog with the local snapshot.
///
/// Every authoritative product is kept verbatim and wins on id collision.
/// Local products whose id is unknown upstream are appended in their local
/// order. Local edits to authoritative products are discarded.
#[must_use]
pub fn reconcile(authoritative: Catalog, local: Option<&Catalog>) -> Reconciliation {
    let extra: Vec<_> = match local {
        Some(local) => {
            let upstream: HashSet<&ProductId> = authoritative.ids().collect();
            local
                .iter()
                .filter(|product| !upstream.contains(&product.id))
                .cloned()
                .collect()
        }
        None => Vec::new(),
    };

    let authoritative_count = authoritative.len();
    let local_only: Vec<ProductId> = extra.iter().map(|p| p.id.clone()).collect();

    let mut products = authoritative.into_products();
    products.extend(extra);

    if !local_only.is_empty() {
        info!(
            "Kept {} local-only products on top of {} authoritative ones",
            local_only.len(),
            authoritative_count
        );
    }

    Reconciliation {
        catalog: Catalog::from_products(products),
        authoritative: authoritative_count,
        local_only,
    }
}

/// Decode the authoritative snapshot text.
///
/// # Errors
///
/// Returns `SnapshotError::Fetch` if the snapshot could not be retrieved and
/// `SnapshotError::Format` if it is malformed.
pub fn decode_snapshot(snapshot: Result<String, FetchError>) -> Result<Catalog, SnapshotError> {
    let text = snapshot?;
    Ok(decode_structured(&text)?)
}

/// Decode the persisted local snapshot. A corrupt snapshot is logged and
/// treated as absent.
#[must_use]
pub fn decode_local(text: Option<&str>) -> Option<Catalog> {
    let text = text?;
    match decode_structured(text) {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            warn!("Ignoring unreadable local catalog: {e}");
            None
        }
    }
}
