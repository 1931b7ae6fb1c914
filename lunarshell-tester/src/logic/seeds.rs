use anyhow::{Result, bail};

/// Resolve CLI seed tokens into numeric seeds.
///
/// Accepts decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hex. Duplicates keep their first position.
pub fn resolve_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let seed = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16).ok()
        } else if let Ok(value) = token.parse::<i64>() {
            Some(value.unsigned_abs())
        } else {
            token.parse::<u64>().ok()
        };
        let Some(seed) = seed else {
            bail!("Unrecognized seed `{token}`");
        };
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        bail!("No seeds provided");
    }
    Ok(seeds)
}

/// Split a comma-separated CLI value, trimming blanks.
pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn seeds_accept_decimal_hex_and_negative() {
        let seeds = resolve_seeds(&split_csv("7, 0x1f, -3, 7, 18446744073709551615")).unwrap();
        assert_eq!(seeds, vec![7, 31, 3, u64::MAX]);
    }

    #[test]
    fn unknown_seed_tokens_are_rejected() {
        let err = resolve_seeds(&split_csv("12,moon")).unwrap_err();
        assert!(err.to_string().contains("moon"));
        assert!(resolve_seeds(&[]).is_err());
    }
}
