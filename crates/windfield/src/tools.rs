use rand::Rng;
use rand::distr::Uniform;

/// Random 8-digit seed, short enough to read back from a log line
pub fn generate_seed8() -> u32 {
    let mut rng = rand::rng();
    match Uniform::new(0u32, 100_000_000u32) {
        Ok(range) => rng.sample(range),
        Err(_) => rng.random(),
    }
}

pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive `N` decorrelated 32-bit seeds from one user seed
pub fn derive_seeds<const N: usize>(seed: u32) -> [u32; N] {
    let mut state = seed as u64;
    std::array::from_fn(|_| {
        state = splitmix64(state);
        (state >> 32) as u32
    })
}
