//! Normalisation et unicité des noms de zones

use std::collections::HashMap;

/// Supprime les accents usuels du français
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'à' | 'â' | 'ä' => 'a',
            'À' | 'Â' | 'Ä' => 'A',
            'ô' | 'ö' => 'o',
            'Ô' | 'Ö' => 'O',
            'î' | 'ï' => 'i',
            'Î' | 'Ï' => 'I',
            'ù' | 'û' | 'ü' => 'u',
            'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            c => c,
        })
        .collect()
}

/// Rend les noms uniques en suffixant les doublons : `Nom (2)`, `Nom (3)`...
///
/// Retourne, pour chaque nom renommé, sa position et son nouveau nom.
pub fn dedupe_names(names: &mut [String]) -> Vec<(usize, String)> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut renamed = Vec::new();

    for name in names.iter() {
        seen.entry(name.clone()).or_insert(0);
    }

    let mut occurrences: HashMap<String, usize> = HashMap::new();
    for (i, name) in names.iter_mut().enumerate() {
        let count = occurrences.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            continue;
        }

        // Éviter de retomber sur un nom existant ("A (2)" déjà présent)
        let mut suffix = *count;
        let mut candidate = format!("{} ({})", name, suffix);
        while seen.contains_key(&candidate) {
            suffix += 1;
            candidate = format!("{} ({})", name, suffix);
        }
        seen.insert(candidate.clone(), 0);
        *name = candidate.clone();
        renamed.push((i, candidate));
    }

    renamed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Cité Smaïl Yefsah"), "Cite Smail Yefsah");
        assert_eq!(normalize_name("  Bâtiment Ô "), "Batiment O");
        assert_eq!(normalize_name("Cité Universitaire CUB3"), "Cite Universitaire CUB3");
    }

    #[test]
    fn test_dedupe_names() {
        let mut names = vec![
            "Rabia Tahar".to_string(),
            "Sorecal".to_string(),
            "Rabia Tahar".to_string(),
            "Rabia Tahar".to_string(),
        ];
        let renamed = dedupe_names(&mut names);

        assert_eq!(names, vec!["Rabia Tahar", "Sorecal", "Rabia Tahar (2)", "Rabia Tahar (3)"]);
        assert_eq!(renamed.len(), 2);
        assert_eq!(renamed[0], (2, "Rabia Tahar (2)".to_string()));
    }

    #[test]
    fn test_dedupe_avoids_existing_suffix() {
        let mut names = vec!["A".to_string(), "A (2)".to_string(), "A".to_string()];
        dedupe_names(&mut names);
        assert_eq!(names, vec!["A", "A (2)", "A (3)"]);
    }
}
