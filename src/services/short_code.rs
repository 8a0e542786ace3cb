use crate::db::{NewLink, Repository};
use crate::error::{AppError, AppResult};
use crate::models::Link;

/// Character set for generating short codes.
const ALPHABET_CHARS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Service for allocating unique short codes.
pub struct ShortCodeService;

impl ShortCodeService {
    /// Generate one random base62 code of the given length.
    pub fn random_code(length: usize) -> String {
        nanoid::nanoid!(length, ALPHABET_CHARS)
    }

    /// Allocate a link under a caller-supplied alias.
    ///
    /// The alias is inserted as-is; the database uniqueness constraint is the
    /// only arbiter, so two concurrent requests for the same alias resolve to
    /// exactly one winner. A taken alias fails with `AliasConflict` and is
    /// never suffixed or otherwise mutated.
    pub async fn allocate_alias(
        repository: &Repository,
        alias: &str,
        link: &NewLink<'_>,
    ) -> AppResult<Link> {
        match repository.insert_link(alias, link).await {
            Ok(created) => Ok(created),
            Err(AppError::DuplicateCode(_)) => Err(AppError::AliasConflict(alias.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Allocate a link under a freshly generated code.
    ///
    /// Collisions are detected by the insert itself (unique-constraint
    /// violation), not by a racy check-then-insert. Each collision retries
    /// with a new random code up to `max_attempts`, after which allocation
    /// fails with `GenerationExhausted` - not expected in normal operation
    /// at sane code lengths.
    pub async fn allocate_generated(
        repository: &Repository,
        length: usize,
        max_attempts: u32,
        link: &NewLink<'_>,
    ) -> AppResult<Link> {
        for _ in 0..max_attempts {
            let code = Self::random_code(length);

            match repository.insert_link(&code, link).await {
                Ok(created) => return Ok(created),
                Err(AppError::DuplicateCode(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::GenerationExhausted)
    }
}
