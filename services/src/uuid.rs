use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary string id.
///
/// Qdrant point ids must be UUIDs or unsigned integers, so rule ids like
/// `sun_house_1` are mapped through this to keep upserts idempotent.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_same_uuid() {
        assert_eq!(stable_uuid("sun_house_1"), stable_uuid("sun_house_1"));
        assert_ne!(stable_uuid("sun_house_1"), stable_uuid("sun_house_2"));
    }
}
