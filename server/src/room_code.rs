use std::{borrow::Borrow, fmt};

use rand::{Rng, SeedableRng, rngs::StdRng};

pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RoomCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

pub fn generate_code<R: Rng + ?Sized>(rng: &mut R, len: usize) -> RoomCode {
    let code = (0..len)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect::<String>();

    RoomCode(code)
}

/// Smallest length >= `base_len` whose code space is more than twice the
/// number of active rooms.
pub fn code_length_for(base_len: usize, active_rooms: usize) -> usize {
    let mut len = base_len.max(1);
    let wanted = (active_rooms as u128).saturating_mul(2);

    loop {
        let space = match u32::try_from(len)
            .ok()
            .and_then(|exp| (ROOM_CODE_ALPHABET.len() as u128).checked_pow(exp))
        {
            Some(space) => space,
            None => return len,
        };

        if space > wanted {
            return len;
        }

        len += 1;
    }
}

pub trait CodeSource: Send {
    fn next_code(&mut self, len: usize) -> RoomCode;
}

pub struct RandomCodes<R> {
    rng: R,
}

impl<R: Rng> RandomCodes<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomCodes<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng + Send> CodeSource for RandomCodes<R> {
    fn next_code(&mut self, len: usize) -> RoomCode {
        generate_code(&mut self.rng, len)
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;

    use super::*;

    /// Hands out a fixed script of codes, then falls back to a seeded rng.
    pub struct ScriptedCodes {
        script: VecDeque<RoomCode>,
        fallback: RandomCodes<StdRng>,
    }

    impl ScriptedCodes {
        pub fn new(codes: &[&str]) -> Self {
            Self {
                script: codes.iter().map(|c| RoomCode::new(*c)).collect(),
                fallback: RandomCodes::new(StdRng::seed_from_u64(7)),
            }
        }
    }

    impl CodeSource for ScriptedCodes {
        fn next_code(&mut self, len: usize) -> RoomCode {
            match self.script.pop_front() {
                Some(code) => code,
                None => self.fallback.next_code(len),
            }
        }
    }
}
