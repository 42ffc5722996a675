use lot_common::{stall_id, StallBox, StallRecord};

/// First id handed out in every detection run
pub const FIRST_STALL_ID: u32 = 1;

/// Turn boxes into stall records, numbering from `next_id`.
///
/// Returns the records together with the id to continue from, so numbering
/// can run across several aisles without shared state.
pub fn synthesize_stalls(
    boxes: &[StallBox],
    next_id: u32,
    confidence: f64,
) -> (Vec<StallRecord>, u32) {
    let records: Vec<StallRecord> = boxes
        .iter()
        .zip(next_id..)
        .map(|(stall_box, id)| StallRecord::from_box(stall_id(id), stall_box, confidence))
        .collect();
    let next_id = next_id + records.len() as u32;
    (records, next_id)
}
