//! The persisted catalog header: version, layout, and id counters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{error::CatalogError, traces::TracesId};

/// Key under which the state record is stored. Graph keys start with a
/// non-zero vertex count, so the leading zero keeps it apart.
pub(super) const STATE_KEY: [u8; 3] = [0x00, 0x00, 0x01];

pub(super) const MAJOR_VERSION: u32 = 2022;
pub(super) const MINOR_VERSION: u32 = 1;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(super) struct CatalogState {
    pub(super) major_version: u32,
    pub(super) minor_version: u32,
    pub(super) trace_count: usize,
    pub(super) is_prime_catalog: bool,
    num_traces: Vec<u64>,
    num_primes: Vec<u64>,
}

impl CatalogState {
    pub(super) fn new(trace_count: usize, is_prime_catalog: bool) -> Self {
        Self {
            major_version: MAJOR_VERSION,
            minor_version: MINOR_VERSION,
            trace_count,
            is_prime_catalog,
            num_traces: vec![0; trace_count + 1],
            num_primes: vec![0; trace_count + 1],
        }
    }

    pub(super) fn decode(bytes: &[u8]) -> Result<Self, CatalogError> {
        let state: Self = serde_json::from_slice(bytes).map_err(|err| CatalogError::CorruptState {
            message: Arc::from(err.to_string()),
        })?;
        let slots = state.trace_count + 1;
        if state.num_traces.len() != slots || state.num_primes.len() != slots {
            return Err(CatalogError::CorruptState {
                message: Arc::from("counter tables do not match the trace count"),
            });
        }
        Ok(state)
    }

    pub(super) fn encode(&self) -> Result<Vec<u8>, CatalogError> {
        serde_json::to_vec(self).map_err(|err| CatalogError::CorruptState {
            message: Arc::from(err.to_string()),
        })
    }

    pub(super) fn num_traces(&self, nv: usize) -> u64 {
        self.num_traces.get(nv).copied().unwrap_or(0)
    }

    pub(super) fn num_primes(&self, nv: usize) -> u64 {
        self.num_primes.get(nv).copied().unwrap_or(0)
    }

    /// Issues the next traces id for `nv` vertices.
    pub(super) fn issue_traces_id(&mut self, nv: usize) -> Result<TracesId, CatalogError> {
        issue(&mut self.num_traces, nv)
    }

    pub(super) fn issue_prime_id(&mut self, nv: usize) -> Result<TracesId, CatalogError> {
        issue(&mut self.num_primes, nv)
    }
}

fn issue(counters: &mut [u64], nv: usize) -> Result<TracesId, CatalogError> {
    let trace_count = counters.len().saturating_sub(1);
    let (Ok(size), Some(counter)) = (u8::try_from(nv), counters.get_mut(nv)) else {
        return Err(CatalogError::GraphTooLarge {
            vertex_count: nv,
            trace_count,
        });
    };
    *counter += 1;
    Ok(TracesId::new(size, *counter))
}
