/// Record identifiers assigned by the persistence service are BIGSERIAL.
pub type RecordId = i64;
