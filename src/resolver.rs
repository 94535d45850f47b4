use crate::models::{ElectivePair, LectureKind, LectureTemplate, Student};
use std::collections::{BTreeMap, HashSet};

/// All subject names offered as electives for the student's (branch, semester).
pub fn elective_names(electives: &[ElectivePair]) -> HashSet<String> {
    let mut names = HashSet::new();
    for pair in electives {
        if let Some(first) = &pair.first {
            names.insert(first.clone());
        }
        if let Some(second) = &pair.second {
            names.insert(second.clone());
        }
    }
    names
}

/// Did this student pick the subject as one of their two elective choices?
pub fn chose_elective(student: &Student, subject: &str) -> bool {
    student.elective_choice1.as_deref() == Some(subject)
        || student.elective_choice2.as_deref() == Some(subject)
}

/// A template applies to the student directly when it has no batch
/// restriction, or its batch label ends with the student's sub-division id
/// ("D11" matches sub-division "1").
pub fn batch_matches(template: &LectureTemplate, student: &Student) -> bool {
    match template.batch.as_deref() {
        // An empty label is treated the same as no batch: whole class.
        None | Some("") => true,
        Some(batch) => batch.ends_with(&student.sub_division),
    }
}

/// Filters the (branch, division, semester) template universe down to the
/// slots this student is actually expected to attend.
pub fn resolve_templates(
    templates: Vec<LectureTemplate>,
    electives: &[ElectivePair],
    student: &Student,
) -> Vec<LectureTemplate> {
    let elective_subjects = elective_names(electives);

    // An elective the student did not choose carries no obligation at all.
    let candidates: Vec<LectureTemplate> = templates
        .into_iter()
        .filter(|t| {
            if elective_subjects.contains(&t.subject) {
                chose_elective(student, &t.subject)
            } else {
                true
            }
        })
        .collect();

    // One section per (subject, kind), even when several batches offer it
    // at different times.
    let mut grouped: BTreeMap<(String, LectureKind), Vec<LectureTemplate>> = BTreeMap::new();
    for template in candidates {
        grouped
            .entry((template.subject.clone(), template.kind))
            .or_default()
            .push(template);
    }

    let mut resolved = Vec::new();
    for ((subject, _), group) in grouped {
        let is_elective = elective_subjects.contains(&subject);
        let (matches, others): (Vec<LectureTemplate>, Vec<LectureTemplate>) =
            group.into_iter().partition(|t| batch_matches(t, student));

        if !matches.is_empty() {
            // Case A: sessions filed for this student's batch exist. Use only
            // them, so a D12 student never also lands in the D11 section.
            resolved.extend(matches);
        } else if is_elective {
            // Case B: no session under this batch, but the elective is still
            // mandatory. The student attends whichever section exists.
            resolved.extend(others);
        }
        // Core subjects offered only to other batches do not apply here.
    }
    resolved
}
