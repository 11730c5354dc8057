// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Chunked program upload pipeline.
//!
//! One upload walks `Stopping → Invalidating → Transferring → Finalizing →
//! Done`; an error in any phase aborts the remainder and surfaces to the
//! caller while the session stays connected. Ordering invariants: the
//! size-0 meta write precedes every ram write of the upload, ram offsets
//! are strictly increasing and contiguous, and the final meta write carries
//! exactly the number of bytes transferred.

use tracing::debug;

use crate::error::{HubError, Result};
use crate::protocol::codec::Command;
use crate::protocol::status::RevisionDependent;
use crate::session::SessionCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadPhase {
    Stopping,
    Invalidating,
    Transferring,
    Finalizing,
    Done,
}

fn enter(phase: UploadPhase) {
    debug!(?phase, "upload phase");
}

/// Transient per-upload state: the program bytes and the chunk geometry.
struct UploadSession<'a> {
    program: &'a [u8],
    chunk_size: usize,
}

impl<'a> UploadSession<'a> {
    fn chunk_count(&self) -> usize {
        self.program.len().div_ceil(self.chunk_size)
    }

    /// Contiguous, non-overlapping `(offset, payload)` chunks covering the
    /// whole program exactly once.
    fn chunks(&self) -> impl Iterator<Item = (u32, &'a [u8])> {
        let chunk_size = self.chunk_size;
        self.program
            .chunks(chunk_size)
            .enumerate()
            .map(move |(index, payload)| ((index * chunk_size) as u32, payload))
    }
}

pub(crate) async fn run(core: &SessionCore, program: &[u8]) -> Result<()> {
    // Validate before any command is enqueued; a doomed transfer helps nobody.
    if let RevisionDependent::Reported(max) = core.capabilities.max_user_program_size {
        if program.len() > max as usize {
            return Err(HubError::ProgramTooLarge {
                size: program.len(),
                max: max as usize,
            });
        }
    }

    let upload = UploadSession {
        program,
        chunk_size: core.capabilities.chunk_size(),
    };
    debug!(
        bytes = program.len(),
        chunks = upload.chunk_count(),
        chunk_size = upload.chunk_size,
        "starting program upload"
    );

    // A running program owns the download region; stop it first. The
    // program-running flag is the only trusted confirmation.
    enter(UploadPhase::Stopping);
    core.queue.submit(Command::Stop, "stop before upload").await?;
    let stopped = core
        .bus
        .wait_for(|s| !s.program_running(), core.config.stop_confirm_timeout)
        .await;
    if !stopped {
        // Some firmware never reports a status on stop; give it a fixed
        // beat and proceed best-effort.
        debug!("no stop confirmation; proceeding after fixed delay");
        tokio::time::sleep(core.config.stop_fallback_delay).await;
    }

    enter(UploadPhase::Invalidating);
    core.queue
        .submit(
            Command::WriteProgramMeta { size: 0 },
            "invalidate stored program",
        )
        .await?;

    enter(UploadPhase::Transferring);
    let total_chunks = upload.chunk_count();
    for (index, (offset, payload)) in upload.chunks().enumerate() {
        core.queue
            .submit(
                Command::WriteRam {
                    offset,
                    payload: payload.to_vec(),
                },
                format!("program chunk {}/{total_chunks} at offset {offset}", index + 1),
            )
            .await?;
    }

    enter(UploadPhase::Finalizing);
    core.queue
        .submit(
            Command::WriteProgramMeta {
                size: program.len() as u32,
            },
            "finalize program size",
        )
        .await?;

    enter(UploadPhase::Done);
    debug!(bytes = program.len(), "program upload complete");
    Ok(())
}
