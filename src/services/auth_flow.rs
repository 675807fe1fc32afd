//! Authorization flow state machine.
//!
//! ```text
//! Unauthenticated ──ConsentUrlBuilt──▶ AwaitingProviderRedirect
//!        ▲                                     │ RedirectIssued
//!        │ ExchangeFailed                      ▼
//!        └──────────────────────────── AwaitingCallback
//!                                              │ CodeExchanged
//!                                              ▼
//!                                        Authenticated
//! ```
//!
//! `ConsentUrlBuilt` restarts the flow from any phase. Sign-out drops the
//! session entirely.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Unauthenticated,
    AwaitingProviderRedirect,
    AwaitingCallback,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    ConsentUrlBuilt,
    RedirectIssued,
    CodeExchanged,
    ExchangeFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event:?} while {phase}")]
pub struct AuthFlowError {
    pub phase: AuthPhase,
    pub event: AuthEvent,
}

impl AuthPhase {
    pub fn apply(self, event: AuthEvent) -> Result<AuthPhase, AuthFlowError> {
        use AuthEvent::*;
        use AuthPhase::*;

        match (self, event) {
            (_, ConsentUrlBuilt) => Ok(AwaitingProviderRedirect),
            (AwaitingProviderRedirect, RedirectIssued) => Ok(AwaitingCallback),
            (AwaitingCallback, CodeExchanged) => Ok(Authenticated),
            (AwaitingCallback, ExchangeFailed) => Ok(Unauthenticated),
            (phase, event) => Err(AuthFlowError { phase, event }),
        }
    }
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthPhase::Unauthenticated => "unauthenticated",
            AuthPhase::AwaitingProviderRedirect => "awaiting provider redirect",
            AuthPhase::AwaitingCallback => "awaiting callback",
            AuthPhase::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}
