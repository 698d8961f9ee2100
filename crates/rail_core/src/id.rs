use rand::Rng;
use uuid::Uuid;

/// Run identifier drawn from a seeded RNG, so replays reuse the same id.
pub fn generate_uuid(rng: &mut impl Rng) -> Uuid {
    let bytes: [u8; 16] = rng.gen();
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}
