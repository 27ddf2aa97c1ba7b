//! Row and cell identity generation
//!
//! Identities tag rows and logical cells and are only compared for equality
//! within one document. Random tokens are four base-36 characters (about
//! 1.7M values), so collisions become likely after roughly a thousand
//! identities in one document. [`IdentityStrategy::Sequential`] never
//! collides within a generator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_LEN: usize = 4;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// How identity tokens are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    /// Short random tokens, e.g. `row-k3f9`
    #[default]
    Random,
    /// A per-generator counter in base 36, e.g. `cell-1a`
    Sequential,
}

/// Produces `row-…` and `cell-…` identities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityGenerator {
    strategy: IdentityStrategy,
    issued: u64,
}

impl IdentityGenerator {
    pub fn new(strategy: IdentityStrategy) -> Self {
        Self {
            strategy,
            issued: 0,
        }
    }

    pub fn strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    /// Number of identities handed out so far
    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn row_id(&mut self) -> String {
        format!("row-{}", self.token())
    }

    pub fn cell_id(&mut self) -> String {
        format!("cell-{}", self.token())
    }

    fn token(&mut self) -> String {
        self.issued += 1;
        match self.strategy {
            IdentityStrategy::Random => {
                let mut bits = Uuid::new_v4().as_u128();
                (0..TOKEN_LEN)
                    .map(|_| {
                        let digit = ALPHABET[(bits % 36) as usize] as char;
                        bits /= 36;
                        digit
                    })
                    .collect()
            }
            IdentityStrategy::Sequential => base36(self.issued),
        }
    }
}

fn base36(mut n: u64) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(ALPHABET[(n % 36) as usize] as char);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}
