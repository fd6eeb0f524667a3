use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::DatabaseError;

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// The id after the largest one in `ids`, starting at 1.
pub fn next_id(ids: impl IntoIterator<Item = u64>) -> Result<u64, DatabaseError> {
    ids.into_iter()
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| DatabaseError::Internal("No ids left".into()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(Vec::new()).unwrap(), 1);
        assert_eq!(next_id([3, 9, 4]).unwrap(), 10);
        assert!(next_id([7, u64::MAX]).is_err());
    }

    #[test]
    fn test_random_string() {
        let value = random_string(12);

        assert_eq!(value.len(), 12);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
