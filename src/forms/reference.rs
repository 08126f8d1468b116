use serde_json::Value;

use super::error::FormError;

/// A row of a reference collection, reduced to what pickers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntity {
    pub id: i64,
    pub display: Vec<String>,
    /// The entity's own parent id (a subject's career), when the kind has one.
    pub cascade_key: Option<i64>,
}

#[cfg(test)]
impl ReferenceEntity {
    pub fn new(id: i64, display: &[&str]) -> Self {
        Self {
            id,
            display: display.iter().map(|s| s.to_string()).collect(),
            cascade_key: None,
        }
    }

    pub fn with_cascade_key(mut self, key: i64) -> Self {
        self.cascade_key = Some(key);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKind {
    Careers,
    Subjects,
    Teachers,
    Classrooms,
    Schedules,
    UnassignedStudentUsers,
    UnassignedTeacherUsers,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Careers => "careers",
            ReferenceKind::Subjects => "subjects",
            ReferenceKind::Teachers => "teachers",
            ReferenceKind::Classrooms => "classrooms",
            ReferenceKind::Schedules => "schedules",
            ReferenceKind::UnassignedStudentUsers => "users.unassigned.students",
            ReferenceKind::UnassignedTeacherUsers => "users.unassigned.teachers",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            ReferenceKind::Careers => "/careers",
            ReferenceKind::Subjects => "/subjects",
            ReferenceKind::Teachers => "/teachers",
            ReferenceKind::Classrooms => "/classrooms",
            ReferenceKind::Schedules => "/schedules",
            ReferenceKind::UnassignedStudentUsers | ReferenceKind::UnassignedTeacherUsers => {
                "/users/unassigned"
            }
        }
    }

    /// Fixed query parameters sent with every fetch of this kind.
    pub fn base_query(self) -> Vec<(String, String)> {
        match self {
            ReferenceKind::UnassignedStudentUsers => vec![
                ("role".to_string(), "STUDENT".to_string()),
                ("entity".to_string(), "students".to_string()),
            ],
            ReferenceKind::UnassignedTeacherUsers => vec![
                ("role".to_string(), "TEACHER".to_string()),
                ("entity".to_string(), "teachers".to_string()),
            ],
            _ => Vec::new(),
        }
    }

    /// Collections only an administrator may read.
    pub fn admin_only(self) -> bool {
        matches!(
            self,
            ReferenceKind::UnassignedStudentUsers | ReferenceKind::UnassignedTeacherUsers
        )
    }

    /// Query key carrying the cascade key for scoped fetches.
    pub fn scope_param(self) -> Option<&'static str> {
        match self {
            ReferenceKind::Subjects => Some("careerId"),
            _ => None,
        }
    }

    fn cascade_field(self) -> Option<&'static str> {
        match self {
            ReferenceKind::Subjects => Some("careerId"),
            _ => None,
        }
    }

    /// Display fields in label order. Parenthesized parts are qualifiers.
    fn display_from(self, row: &Value) -> Vec<String> {
        let text = |key: &str| json_text(row.get(key));
        let paren = |key: &str| {
            let v = json_text(row.get(key));
            if v.is_empty() {
                None
            } else {
                Some(format!("({v})"))
            }
        };
        match self {
            ReferenceKind::Careers
            | ReferenceKind::Teachers
            | ReferenceKind::Classrooms => vec![text("name")],
            ReferenceKind::Subjects => {
                let mut out = vec![text("name")];
                out.extend(paren("careerName"));
                out
            }
            ReferenceKind::Schedules => {
                let mut out = vec![text("time")];
                out.extend(paren("shift"));
                out
            }
            ReferenceKind::UnassignedStudentUsers | ReferenceKind::UnassignedTeacherUsers => {
                let mut out = vec![text("email")];
                out.extend(paren("username"));
                out
            }
        }
    }

    pub fn entity_from_json(
        self,
        row: &Value,
        scope: Option<i64>,
    ) -> Result<ReferenceEntity, FormError> {
        let id = row.get("id").and_then(json_int).ok_or_else(|| {
            FormError::InvalidResponse(format!("{} row without integer id", self.as_str()))
        })?;
        let cascade_key = self
            .cascade_field()
            .and_then(|f| row.get(f))
            .and_then(json_int)
            .or(scope);
        Ok(ReferenceEntity {
            id,
            display: self.display_from(row),
            cascade_key,
        })
    }

    pub fn collection_from_json(
        self,
        body: &Value,
        scope: Option<i64>,
    ) -> Result<Vec<ReferenceEntity>, FormError> {
        let Some(rows) = body.as_array() else {
            return Err(FormError::InvalidResponse(format!(
                "{} is not a list",
                self.as_str()
            )));
        };
        rows.iter()
            .map(|row| self.entity_from_json(row, scope))
            .collect()
    }
}

/// Integer from a JSON number or numeric string; the back end is loose about both.
pub fn json_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Text rendition of a scalar JSON value; null and missing become "".
pub fn json_text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
