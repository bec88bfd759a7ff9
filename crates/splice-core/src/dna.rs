/// Complement a single DNA base, IUPAC ambiguity codes included.
pub fn complement_base(base: char) -> char {
    match base.to_ascii_uppercase() {
        'A' => 'T',
        'T' => 'A',
        'G' => 'C',
        'C' => 'G',
        'R' => 'Y',
        'Y' => 'R',
        'S' => 'S',
        'W' => 'W',
        'K' => 'M',
        'M' => 'K',
        'B' => 'V',
        'V' => 'B',
        'D' => 'H',
        'H' => 'D',
        'N' => 'N',
        other => other,
    }
}

/// Reverse complement of a DNA sequence
pub fn reverse_complement(seq: &str) -> String {
    seq.chars().rev().map(complement_base).collect()
}

/// Check if a sequence contains only unambiguous DNA bases.
pub fn is_dna(seq: &str) -> bool {
    seq.chars()
        .all(|c| matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T'))
}

/// Canonical form used when comparing a derived sequence against a stored
/// one: uppercased with placeholder `N` bases stripped, so that padding
/// inserted for not-yet-sequenced parts never counts as a difference.
pub fn normalized(seq: &str) -> String {
    seq.chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| *c != 'N')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complement_base() {
        assert_eq!(complement_base('A'), 'T');
        assert_eq!(complement_base('g'), 'C');
        assert_eq!(complement_base('N'), 'N');
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement("ATCGATCG"), "CGATCGAT");
        assert_eq!(reverse_complement(""), "");
    }

    #[test]
    fn test_is_dna() {
        assert!(is_dna("acgtACGT"));
        assert!(!is_dna("ACGTN"));
    }

    #[test]
    fn test_normalized_strips_placeholders() {
        assert_eq!(normalized("atcg"), "ATCG");
        assert_eq!(normalized("ATNNCG"), "ATCG");
        assert_eq!(normalized("NNNN"), "");
    }
}
