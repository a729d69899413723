use std::fmt;
use std::str::FromStr;

use crate::error::TermStoreError;

/// Where a term record's name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermSource {
    /// The qualifying concept's own name.
    Name,
    /// A synonym of a qualifying concept.
    Synonym,
    /// The name of a non-standard concept that maps to a qualifying concept.
    Mapped,
    /// A synonym of such a mapped concept.
    MappedSynonym,
}

impl TermSource {
    pub const ALL: [TermSource; 4] = [
        TermSource::Name,
        TermSource::Synonym,
        TermSource::Mapped,
        TermSource::MappedSynonym,
    ];

    /// Wire string stored in the terms database and emitted by the query.
    pub fn as_str(self) -> &'static str {
        match self {
            TermSource::Name => "name",
            TermSource::Synonym => "synonym",
            TermSource::Mapped => "mapped",
            TermSource::MappedSynonym => "mapped synonym",
        }
    }
}

impl fmt::Display for TermSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TermSource {
    type Err = TermStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(TermSource::Name),
            "synonym" => Ok(TermSource::Synonym),
            "mapped" => Ok(TermSource::Mapped),
            "mapped synonym" => Ok(TermSource::MappedSynonym),
            other => Err(TermStoreError::UnknownSource(other.to_string())),
        }
    }
}

/// One name for one concept, tagged with its provenance.
///
/// For `name` and `synonym` rows `standard_concept_id == concept_id`. For
/// mapped rows `concept_id` is the non-standard source concept and
/// `standard_concept_id` the qualifying standard concept it maps to; the
/// query excludes self-mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRecord {
    pub concept_id: i32,
    pub standard_concept_id: i32,
    pub concept_name: String,
    pub source: TermSource,
}

impl TryFrom<(i32, i32, String, String)> for TermRecord {
    type Error = TermStoreError;

    fn try_from(row: (i32, i32, String, String)) -> Result<Self, Self::Error> {
        let (concept_id, standard_concept_id, concept_name, source) = row;
        Ok(TermRecord {
            concept_id,
            standard_concept_id,
            concept_name,
            source: source.parse()?,
        })
    }
}

/// Aggregated embedding input for one concept.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptText {
    pub concept_id: i32,
    pub standard_concept_id: i32,
    pub text: String,
}

/// Which source kinds contribute to aggregated text.
///
/// Mapped synonyms only survive when both synonyms and mapped terms are
/// included, since they are both at once.
#[derive(Debug, Clone, Copy)]
pub struct SourceFilter {
    pub include_synonyms: bool,
    pub include_mapped_terms: bool,
}

impl SourceFilter {
    pub fn excluded(self) -> Vec<TermSource> {
        let mut excluded = Vec::new();
        if !self.include_synonyms {
            excluded.push(TermSource::Synonym);
        }
        if !self.include_mapped_terms {
            excluded.push(TermSource::Mapped);
        }
        if !(self.include_synonyms && self.include_mapped_terms) {
            excluded.push(TermSource::MappedSynonym);
        }
        excluded
    }

    pub fn admits(self, source: TermSource) -> bool {
        !self.excluded().contains(&source)
    }
}

impl From<&crate::models::TermsConfig> for SourceFilter {
    fn from(terms: &crate::models::TermsConfig) -> Self {
        SourceFilter {
            include_synonyms: terms.include_synonyms,
            include_mapped_terms: terms.include_mapped_terms,
        }
    }
}
