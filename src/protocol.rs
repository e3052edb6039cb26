//! Per-request protocol state machine and the coordinator that drives one
//! location-disclosure request through it.

use crate::classifier::GeofenceStatus;
use crate::encoder::Scheme;
use crate::error::{Error, Result};
use crate::roles::{BoundaryEvaluatorTransport, LocationOwner};
use tracing::{debug, warn};

/// Stages of one location-disclosure request. Linear and terminal: no
/// retries happen inside a single request, that is the outer harness's
/// concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    TermsEncoded,
    Submitted,
    Evaluated,
    Decrypted,
    Classified,
    Returned,
    Errored,
}

impl Stage {
    /// Legal transitions: each stage to its linear successor, plus
    /// `Errored` from `Submitted` or `Evaluated` on validation or
    /// downstream failure.
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Created, Stage::TermsEncoded)
                | (Stage::TermsEncoded, Stage::Submitted)
                | (Stage::Submitted, Stage::Evaluated)
                | (Stage::Evaluated, Stage::Decrypted)
                | (Stage::Decrypted, Stage::Classified)
                | (Stage::Classified, Stage::Returned)
                | (Stage::Submitted, Stage::Errored)
                | (Stage::Evaluated, Stage::Errored)
        )
    }
}

/// Tracks one request through its lifecycle. Advancing along an illegal
/// edge is a programming error and panics.
#[derive(Debug)]
pub struct DisclosureRequest {
    stage: Stage,
}

impl DisclosureRequest {
    pub fn new() -> Self {
        Self { stage: Stage::Created }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn advance(&mut self, next: Stage) {
        assert!(
            self.stage.can_advance_to(next),
            "illegal protocol transition {:?} -> {next:?}",
            self.stage,
        );
        debug!("request stage {:?} -> {next:?}", self.stage);
        self.stage = next;
    }
}

impl Default for DisclosureRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal result the Location Owner receives.
///
/// `Unknown` is the transport-failure fallback: a classification is never
/// fabricated when a downstream role is unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisclosureOutcome {
    Classified(Vec<GeofenceStatus>),
    Unknown { reason: String },
}

/// Drives one disclosure end to end: encode on the owner, submit to the
/// evaluator, collect the relayed classification list.
pub struct ProtocolCoordinator<B: BoundaryEvaluatorTransport> {
    scheme: Scheme,
    evaluator: B,
}

impl<B: BoundaryEvaluatorTransport> ProtocolCoordinator<B> {
    pub fn new(scheme: Scheme, evaluator: B) -> Self {
        Self { scheme, evaluator }
    }

    pub fn run(&self, owner: &LocationOwner) -> Result<DisclosureOutcome> {
        let mut request = DisclosureRequest::new();

        let terms = owner.encode_terms(self.scheme)?;
        request.advance(Stage::TermsEncoded);

        let body = owner.submit_request(&terms);
        request.advance(Stage::Submitted);

        match self.evaluator.submit_location(&body) {
            Ok(response) => {
                // A success response implies the downstream stages all
                // completed on the remote roles.
                request.advance(Stage::Evaluated);
                request.advance(Stage::Decrypted);
                request.advance(Stage::Classified);
                let statuses = response.results.iter().map(|entry| entry.status).collect();
                request.advance(Stage::Returned);
                Ok(DisclosureOutcome::Classified(statuses))
            }
            Err(Error::Transport(reason)) => {
                request.advance(Stage::Errored);
                warn!("disclosure abandoned, downstream unreachable: {reason}");
                Ok(DisclosureOutcome::Unknown { reason })
            }
            Err(other) => {
                request.advance(Stage::Errored);
                Err(other)
            }
        }
    }
}
