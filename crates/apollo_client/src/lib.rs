//! Apollo API client. The only crate that talks HTTP.
//!
//! Covers the three calls the enrollment run needs: person match (with
//! contact creation fallback), paginated sequence listing, and adding a
//! contact to a sequence.
//!
//! Blocking reqwest client. No retries: a failed call is reported once and
//! the caller decides what it means for the row.

mod client;
mod model;

pub use client::{ApolloClient, ApolloError, ContactMatch, RawEnrollmentResult, SequenceListing};
pub use client::{DEFAULT_API_BASE, PER_PAGE};
pub use model::{Campaign, EnrollmentResponse, LinkedContact, Organization, Person};
