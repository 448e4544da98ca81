/// Largest source-to-target distance a span record can represent, in epochs.
///
/// Votes further apart than this fall outside the tracked window and are only
/// checked for double votes. Must fit in the u16 span fields.
pub const MAX_SPAN: u64 = 54000;
