//! Builds the vocabulary term query.
//!
//! One Postgres statement whose result set is the union of four row classes,
//! each tagged with its source kind: the names of qualifying concepts, their
//! synonyms, the names of non-standard concepts mapped onto them, and the
//! synonyms of those mapped concepts. Row order is unspecified.

use crate::models::TermsConfig;

/// A built term query: SQL text plus the string-array binds in placeholder
/// order. Every bind is applied with `= ANY($n)`.
#[derive(Debug, Clone)]
pub struct TermQuery {
    pub sql: String,
    pub binds: Vec<Vec<String>>,
}

/// Construct the term query for one vocabulary schema and filter set.
pub fn build_term_query(schema: &str, terms: &TermsConfig) -> TermQuery {
    let mut binds: Vec<Vec<String>> = Vec::new();

    let mut standard_flags = vec!["S".to_string()];
    if terms.include_classification_concepts {
        standard_flags.push("C".to_string());
    }
    binds.push(standard_flags);
    let mut conditions = vec![format!("c.standard_concept = ANY(${})", binds.len())];

    if !terms.domain_ids.is_empty() {
        binds.push(terms.domain_ids.clone());
        conditions.push(format!("c.domain_id = ANY(${})", binds.len()));
    }

    if !terms.classification_vocabularies.is_empty() {
        binds.push(terms.classification_vocabularies.clone());
        conditions.push(format!(
            "(c.standard_concept = 'S' OR c.vocabulary_id = ANY(${}))",
            binds.len()
        ));
    }

    // Pruning against the usage-count table only keeps concepts that have a
    // count row at all.
    let used_join = if terms.restrict_to_used_concepts {
        format!(
            "\n    INNER JOIN {schema}.concept_record_count rc ON rc.concept_id = c.concept_id"
        )
    } else {
        String::new()
    };

    let where_clause = conditions.join("\n      AND ");

    let sql = format!(
        "WITH qualifying AS (\n\
         \x20   SELECT c.concept_id, c.concept_name\n\
         \x20   FROM {schema}.concept c{used_join}\n\
         \x20   WHERE {where_clause}\n\
         ),\n\
         mapped_sources AS (\n\
         \x20   SELECT cr.concept_id_1 AS concept_id, cr.concept_id_2 AS standard_concept_id\n\
         \x20   FROM {schema}.concept_relationship cr\n\
         \x20   INNER JOIN qualifying q ON q.concept_id = cr.concept_id_2\n\
         \x20   WHERE cr.relationship_id = 'Maps to'\n\
         \x20     AND cr.concept_id_1 <> cr.concept_id_2\n\
         \x20   GROUP BY cr.concept_id_1, cr.concept_id_2\n\
         )\n\
         SELECT q.concept_id, q.concept_id AS standard_concept_id, q.concept_name, 'name' AS source\n\
         FROM qualifying q\n\
         UNION ALL\n\
         SELECT cs.concept_id, cs.concept_id, cs.concept_synonym_name, 'synonym'\n\
         FROM {schema}.concept_synonym cs\n\
         WHERE cs.concept_id IN (SELECT concept_id FROM qualifying)\n\
         UNION ALL\n\
         SELECT m.concept_id, m.standard_concept_id, c.concept_name, 'mapped'\n\
         FROM mapped_sources m\n\
         INNER JOIN {schema}.concept c ON c.concept_id = m.concept_id\n\
         UNION ALL\n\
         SELECT cs.concept_id, m.standard_concept_id, cs.concept_synonym_name, 'mapped synonym'\n\
         FROM {schema}.concept_synonym cs\n\
         INNER JOIN mapped_sources m ON m.concept_id = cs.concept_id"
    );

    TermQuery { sql, binds }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_terms() -> TermsConfig {
        TermsConfig {
            domain_ids: Vec::new(),
            include_classification_concepts: false,
            classification_vocabularies: Vec::new(),
            include_synonyms: true,
            include_mapped_terms: true,
            max_text_characters: 2048,
            restrict_to_used_concepts: false,
        }
    }

    fn placeholder_count(sql: &str) -> usize {
        (1..)
            .take_while(|n| sql.contains(&format!("${n}")))
            .count()
    }

    #[test]
    fn test_minimal_query_binds_standard_flags_only() {
        let query = build_term_query("vocab", &base_terms());
        assert_eq!(query.binds, vec![vec!["S".to_string()]]);
        assert_eq!(placeholder_count(&query.sql), 1);
        assert!(!query.sql.contains("domain_id"));
        assert!(!query.sql.contains("concept_record_count"));
    }

    #[test]
    fn test_classification_flag_extends_standard_set() {
        let terms = TermsConfig {
            include_classification_concepts: true,
            ..base_terms()
        };
        let query = build_term_query("vocab", &terms);
        assert_eq!(query.binds[0], vec!["S".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_domain_filter_adds_bind() {
        let terms = TermsConfig {
            domain_ids: vec!["Condition".to_string()],
            ..base_terms()
        };
        let query = build_term_query("vocab", &terms);
        assert!(query.sql.contains("c.domain_id = ANY($2)"));
        assert_eq!(query.binds.len(), 2);
        assert_eq!(query.binds[1], vec!["Condition".to_string()]);
    }

    #[test]
    fn test_classification_vocabulary_filter_keeps_strictly_standard() {
        let terms = TermsConfig {
            classification_vocabularies: vec!["ATC".to_string()],
            ..base_terms()
        };
        let query = build_term_query("vocab", &terms);
        assert!(
            query
                .sql
                .contains("(c.standard_concept = 'S' OR c.vocabulary_id = ANY($2))")
        );
        assert_eq!(query.binds.len(), 2);
    }

    #[test]
    fn test_restrict_to_used_concepts_joins_count_table() {
        let terms = TermsConfig {
            restrict_to_used_concepts: true,
            ..base_terms()
        };
        let query = build_term_query("vocab", &terms);
        assert!(query.sql.contains("vocab.concept_record_count"));
    }

    #[test]
    fn test_self_mappings_always_excluded() {
        let query = build_term_query("vocab", &base_terms());
        assert!(query.sql.contains("cr.concept_id_1 <> cr.concept_id_2"));
    }

    #[test]
    fn test_all_filters_bind_in_placeholder_order() {
        let terms = TermsConfig {
            domain_ids: vec!["Drug".to_string()],
            include_classification_concepts: true,
            classification_vocabularies: vec!["ATC".to_string(), "MeSH".to_string()],
            restrict_to_used_concepts: true,
            ..base_terms()
        };
        let query = build_term_query("cdm_vocab", &terms);
        assert_eq!(query.binds.len(), 3);
        assert_eq!(placeholder_count(&query.sql), 3);
        assert!(query.sql.contains("cdm_vocab.concept c"));
        assert!(query.sql.contains("cdm_vocab.concept_synonym cs"));
        assert!(query.sql.contains("cdm_vocab.concept_relationship cr"));
    }

    #[test]
    fn test_all_four_source_kinds_emitted() {
        let query = build_term_query("vocab", &base_terms());
        for tag in ["'name'", "'synonym'", "'mapped'", "'mapped synonym'"] {
            assert!(query.sql.contains(tag), "missing source tag {tag}");
        }
    }
}
