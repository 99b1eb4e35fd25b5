//! Name derivation and resource composition for kubeforge
//!
//! Everything in this crate is pure: the same descriptor always composes the
//! same bundle, and no function here touches the network. Submission lives
//! in `kubeforge-provision`.

mod bundle;
mod names;

pub use bundle::{ResourceBundle, compose};
pub use names::{APP_LABEL, DerivedNames, derive};
