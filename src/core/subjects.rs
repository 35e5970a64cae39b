use crate::core::catalog::columns;
use crate::core::predicate::Predicate;
use crate::error::RecommendError;
use crate::models::SubjectCategory;

/// Elective subjects of the 3+1+2 exam model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Physics,
    Chemistry,
    Biology,
    Politics,
    History,
    Geography,
}

impl Subject {
    pub const ALL: [Subject; 6] = [
        Subject::Physics,
        Subject::Chemistry,
        Subject::Biology,
        Subject::Politics,
        Subject::History,
        Subject::Geography,
    ];

    /// Match a subject name exactly as the exam board writes it
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "物理" => Some(Subject::Physics),
            "化学" => Some(Subject::Chemistry),
            "生物" => Some(Subject::Biology),
            "政治" => Some(Subject::Politics),
            "历史" => Some(Subject::History),
            "地理" => Some(Subject::Geography),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Subject::Physics => "物理",
            Subject::Chemistry => "化学",
            Subject::Biology => "生物",
            Subject::Politics => "政治",
            Subject::History => "历史",
            Subject::Geography => "地理",
        }
    }

    /// Boolean column flagging majors that require this subject
    pub fn requirement_column(self) -> &'static str {
        match self {
            Subject::Physics => columns::REQUIRE_PHYSICS,
            Subject::Chemistry => columns::REQUIRE_CHEMISTRY,
            Subject::Biology => columns::REQUIRE_BIOLOGY,
            Subject::Politics => columns::REQUIRE_POLITICS,
            Subject::History => columns::REQUIRE_HISTORY,
            Subject::Geography => columns::REQUIRE_GEOGRAPHY,
        }
    }

    fn anchor_of(self) -> Option<SubjectCategory> {
        match self {
            Subject::Physics => Some(SubjectCategory::Physics),
            Subject::History => Some(SubjectCategory::History),
            _ => None,
        }
    }
}

/// Validated subject combination of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectFilter {
    pub category: SubjectCategory,
    pub require_physics: bool,
    pub require_chemistry: bool,
    pub require_biology: bool,
    pub require_politics: bool,
    pub require_history: bool,
    pub require_geography: bool,
}

impl SubjectFilter {
    /// Parse a comma separated subject list.
    ///
    /// Exactly one anchor (物理 or 历史) is expected. If both appear, physics
    /// decides the category. Unknown names are ignored.
    pub fn parse(text: &str) -> Result<Self, RecommendError> {
        let mut flags = [false; 6];
        for name in text.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if let Some(subject) = Subject::from_name(name) {
                flags[subject as usize] = true;
            }
        }

        let category = if flags[Subject::Physics as usize] {
            SubjectCategory::Physics
        } else if flags[Subject::History as usize] {
            SubjectCategory::History
        } else {
            return Err(RecommendError::InvalidSubjects(format!(
                "subject combination must include 物理 or 历史, got '{}'",
                text.trim()
            )));
        };

        Ok(Self {
            category,
            require_physics: flags[Subject::Physics as usize],
            require_chemistry: flags[Subject::Chemistry as usize],
            require_biology: flags[Subject::Biology as usize],
            require_politics: flags[Subject::Politics as usize],
            require_history: flags[Subject::History as usize],
            require_geography: flags[Subject::Geography as usize],
        })
    }

    pub fn requires(&self, subject: Subject) -> bool {
        match subject {
            Subject::Physics => self.require_physics,
            Subject::Chemistry => self.require_chemistry,
            Subject::Biology => self.require_biology,
            Subject::Politics => self.require_politics,
            Subject::History => self.require_history,
            Subject::Geography => self.require_geography,
        }
    }

    /// Selected subjects other than the one deciding the category
    pub fn electives(&self) -> impl Iterator<Item = Subject> + '_ {
        Subject::ALL
            .into_iter()
            .filter(move |s| self.requires(*s) && s.anchor_of() != Some(self.category))
    }

    /// Category equality plus, when electives were chosen, one OR-group of
    /// the requirement flags of every selected subject, anchor included.
    pub fn build_conditions(&self) -> Vec<Predicate> {
        let mut conditions = vec![Predicate::eq(columns::SUBJECT_CATEGORY, self.category.code())];
        if self.electives().next().is_none() {
            return conditions;
        }

        let selected = Subject::ALL
            .into_iter()
            .filter(|s| self.requires(*s))
            .filter_map(|s| Predicate::literal(format!("{} = TRUE", s.requirement_column())))
            .collect();
        if let Some(group) = Predicate::or_group(selected) {
            conditions.push(group);
        }

        conditions
    }
}
