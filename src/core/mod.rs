//! Core data types for the point-of-sale catalog.
//!
//! - [`product::Product`]: a sellable item with price, category and optional code
//! - [`product::ProductDraft`]: a product being created or edited
//! - [`catalog::Catalog`]: an ordered product list keyed by [`types::ProductId`]
//! - [`types::Category`]: the closed set of product categories
//!
//! ## Wire names
//!
//! Persisted state and both interchange formats use the field names of the
//! installed data set:
//!
//! | Field       | Wire name     | Required |
//! |-------------|---------------|----------|
//! | id          | `id`          | Yes      |
//! | name        | `nombre`      | Yes      |
//! | price       | `precio`      | Yes      |
//! | code        | `codigo`      | No       |
//! | category    | `categoria`   | Yes      |
//! | description | `descripcion` | No       |

pub mod catalog;
pub mod product;
pub mod types;
