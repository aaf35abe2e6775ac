//! Template identifier catalogue.
//!
//! IHE Patient Care Coordination (PCC TF-2) entry and section templates, plus
//! the HL7 CCD templates the PCC entries co-declare. Only the templates the
//! importer has processors for are listed here.

/// PCC TF-2 6.3.4.11 Concern Entry.
pub const ENT_CONCERN_ENTRY: &str = "1.3.6.1.4.1.19376.1.5.3.1.4.5.1";
/// PCC TF-2 6.3.4.12 Problem Concern Entry.
pub const ENT_PROBLEM_CONCERN: &str = "1.3.6.1.4.1.19376.1.5.3.1.4.5.2";
/// PCC TF-2 6.3.4.13 Allergy and Intolerance Concern.
pub const ENT_ALLERGIES_AND_INTOLERANCES_CONCERN: &str = "1.3.6.1.4.1.19376.1.5.3.1.4.5.3";
/// PCC TF-2 6.3.4.14 Problem Entry.
pub const ENT_PROBLEM_OBSERVATION: &str = "1.3.6.1.4.1.19376.1.5.3.1.4.5";
/// PCC TF-2 6.3.4.15 Allergy and Intolerance Entry.
pub const ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION: &str = "1.3.6.1.4.1.19376.1.5.3.1.4.6";
/// PCC TF-2 6.3.4.3 Severity Entry.
pub const ENT_SEVERITY_OBSERVATION: &str = "1.3.6.1.4.1.19376.1.5.3.1.4.1";
/// PCC TF-2 6.3.4.15 manifestation relationship of an allergy entry.
pub const ENT_MANIFESTATION_RELATION: &str = "1.3.6.1.4.1.19376.1.5.3.1.4.6.1";

/// HL7 CCD 3.5 problem act, co-declared by every PCC concern entry.
pub const CCD_PROBLEM_ACT: &str = "2.16.840.1.113883.10.20.1.27";
/// HL7 CCD alert observation, co-declared by allergy and intolerance entries.
pub const CCD_ALERT_OBSERVATION: &str = "2.16.840.1.113883.10.20.1.18";
/// HL7 CCD problem observation, co-declared by problem entries.
pub const CCD_PROBLEM_OBSERVATION: &str = "2.16.840.1.113883.10.20.1.28";
/// HL7 CCD reaction observation.
pub const CCD_REACTION_OBSERVATION: &str = "2.16.840.1.113883.10.20.1.54";
/// HL7 CCD severity observation.
pub const CCD_SEVERITY_OBSERVATION: &str = "2.16.840.1.113883.10.20.1.55";

/// PCC TF-2 6.3.3.2.1 History of Present Illness section.
pub const SCT_HISTORY_OF_PRESENT_ILLNESS: &str = "1.3.6.1.4.1.19376.1.5.3.1.3.4";
/// PCC TF-2 6.3.3.2.3 Active Problems section.
pub const SCT_ACTIVE_PROBLEMS: &str = "1.3.6.1.4.1.19376.1.5.3.1.3.6";
/// PCC TF-2 6.3.3.2.11 Allergies and Other Adverse Reactions section.
pub const SCT_ALLERGIES_AND_OTHER_ADVERSE_REACTIONS: &str = "1.3.6.1.4.1.19376.1.5.3.1.3.13";

pub const CODE_SYSTEM_LOINC: &str = "2.16.840.1.113883.6.1";
pub const CODE_SYSTEM_ACT_CODE: &str = "2.16.840.1.113883.5.4";
pub const CODE_SYSTEM_OBSERVATION_VALUE: &str = "2.16.840.1.113883.5.1063";
