use crate::errors::{Result, SpecDiffError};
use crate::model::{BatchRecord, SpecState};

/// # Errors
/// * `BatchAlreadyOpen` - If another batch has not been closed yet
pub fn start_batch(state: &mut SpecState, batch_id: String, message: String) -> Result<()> {
    if let Some(open) = &state.open_batch {
        return Err(SpecDiffError::BatchAlreadyOpen {
            open_batch_id: open.batch_id.clone(),
        });
    }
    state.open_batch = Some(BatchRecord {
        batch_id,
        message,
        command_count: 0,
    });
    Ok(())
}

/// # Errors
/// * `BatchNotOpen` - If no batch is open
/// * `BatchMismatch` - If the open batch has a different id
pub fn end_batch(state: &mut SpecState, batch_id: &str) -> Result<()> {
    let open = state
        .open_batch
        .take()
        .ok_or_else(|| SpecDiffError::BatchNotOpen {
            batch_id: batch_id.to_string(),
        })?;
    if open.batch_id != batch_id {
        let expected = open.batch_id.clone();
        state.open_batch = Some(open);
        return Err(SpecDiffError::BatchMismatch {
            expected,
            found: batch_id.to_string(),
        });
    }
    state.batches.push(open);
    Ok(())
}

/// Count a non-marker command against the open batch, if any
pub fn record_command(state: &mut SpecState) {
    if let Some(open) = state.open_batch.as_mut() {
        open.command_count += 1;
    }
}
