//! Status transition rules.
//!
//! ```text
//! READY         → IN_PRODUCTION  needs expected date, materializes serials
//! IN_PRODUCTION → HOLD
//! IN_PRODUCTION → STOPPED
//! IN_PRODUCTION → DONE           needs out date and a serial no. on every row
//! HOLD          → IN_PRODUCTION
//! STOPPED       → IN_PRODUCTION
//! DONE          → IN_PRODUCTION  re-open, clears out date
//! ```
//!
//! Every other pair, self-edges included, is rejected. `apply` is the only
//! code that writes `status`.

use chrono::{DateTime, Utc};

use crate::error::RequestError;
use crate::model::{ProductionRequest, RequestStatus, StatusChange, TransitionExtra};
use crate::model::RequestStatus::{Done, Hold, InProduction, Ready, Stopped};

/// Allowed (from, to) pairs.
pub const EDGES: [(RequestStatus, RequestStatus); 7] = [
    (Ready, InProduction),
    (InProduction, Hold),
    (InProduction, Stopped),
    (InProduction, Done),
    (Hold, InProduction),
    (Stopped, InProduction),
    (Done, InProduction),
];

pub fn is_allowed(from: RequestStatus, to: RequestStatus) -> bool {
    EDGES.contains(&(from, to))
}

/// Statuses reachable in one step, in table order. A renderer uses this to
/// decide which buttons to show.
pub fn targets_from(from: RequestStatus) -> Vec<RequestStatus> {
    EDGES
        .iter()
        .filter(|(f, _)| *f == from)
        .map(|(_, t)| *t)
        .collect()
}

/// Move `request` to `target`, merging `extra`. On error `request` may be
/// partly modified; callers work on a copy and discard it.
pub(crate) fn apply(
    request: &mut ProductionRequest,
    target: RequestStatus,
    extra: &TransitionExtra,
    now: DateTime<Utc>,
) -> Result<(), RequestError> {
    let from = request.status;
    if !is_allowed(from, target) {
        return Err(RequestError::InvalidTransition { from, to: target });
    }
    if extra.out_date.is_some() && target != Done {
        return Err(RequestError::Validation(format!(
            "out date only applies when moving to {}",
            Done
        )));
    }
    if extra.expected_date.is_some() && target != InProduction {
        return Err(RequestError::Validation(format!(
            "expected date only applies when moving to {}",
            InProduction
        )));
    }

    match target {
        InProduction => {
            match (extra.expected_date, from) {
                (Some(date), _) => request.expected_date = Some(date),
                (None, Ready) => {
                    return Err(RequestError::Validation(
                        "expected date is required to start production".into(),
                    ));
                }
                (None, _) => {}
            }
            if from == Done {
                request.out_date = None;
            }
            request.materialize_serials();
        }
        Done => {
            let out_date = extra.out_date.ok_or_else(|| {
                RequestError::Validation("out date is required to finish production".into())
            })?;
            let missing = request.missing_serials();
            if !missing.is_empty() {
                return Err(RequestError::IncompleteSerials { missing });
            }
            request.out_date = Some(out_date);
        }
        Hold | Stopped | Ready => {}
    }

    request.history.push(StatusChange {
        from,
        to: target,
        at: now,
    });
    request.status = target;
    Ok(())
}
