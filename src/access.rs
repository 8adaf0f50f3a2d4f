use crate::model::DataSnapshot;
use serde::Serialize;
use serde_json::json;

pub const ADMIN_ID: &str = "admin";
pub const ADMIN_NAME: &str = "Administrator";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum Role {
    Admin,
    Teacher { subjects: Vec<String> },
    Homeroom { class: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub role: Role,
}

impl User {
    pub fn admin() -> Self {
        Self {
            id: ADMIN_ID.to_string(),
            name: ADMIN_NAME.to_string(),
            role: Role::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum View {
    Dashboard,
    GradeInput,
    Summary,
    ReportCard,
    DataManagement,
    History,
}

const ADMIN_VIEWS: &[View] = &[
    View::Dashboard,
    View::Summary,
    View::ReportCard,
    View::DataManagement,
    View::History,
];
const TEACHER_VIEWS: &[View] = &[
    View::Dashboard,
    View::GradeInput,
    View::Summary,
    View::ReportCard,
];
const HOMEROOM_VIEWS: &[View] = &[View::Dashboard, View::Summary, View::ReportCard];

impl View {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Dashboard" => Some(View::Dashboard),
            "GradeInput" => Some(View::GradeInput),
            "Summary" => Some(View::Summary),
            "ReportCard" => Some(View::ReportCard),
            "DataManagement" => Some(View::DataManagement),
            "History" => Some(View::History),
            _ => None,
        }
    }
}

pub fn views_for(role: &Role) -> &'static [View] {
    match role {
        Role::Admin => ADMIN_VIEWS,
        Role::Teacher { .. } => TEACHER_VIEWS,
        Role::Homeroom { .. } => HOMEROOM_VIEWS,
    }
}

pub fn is_allowed(view: View, role: &Role) -> bool {
    views_for(role).contains(&view)
}

#[derive(Debug, Clone)]
pub struct AccessError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl AccessError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }
}

/// How a user picks their identity on the login screen.
#[derive(Debug, Clone)]
pub enum LoginChoice {
    Admin,
    Teacher { teacher_id: String },
    Homeroom { class: String },
}

pub fn resolve_login(snapshot: &DataSnapshot, choice: &LoginChoice) -> Result<User, AccessError> {
    match choice {
        LoginChoice::Admin => Ok(User::admin()),
        LoginChoice::Teacher { teacher_id } => {
            let t = snapshot.teacher(teacher_id).ok_or_else(|| AccessError {
                details: Some(json!({ "teacherId": teacher_id })),
                ..AccessError::new("not_found", "teacher not found")
            })?;
            Ok(User {
                id: t.id.clone(),
                name: t.name.clone(),
                role: Role::Teacher {
                    subjects: t.subjects.clone(),
                },
            })
        }
        LoginChoice::Homeroom { class } => {
            let hr = snapshot.homeroom_for_class(class).ok_or_else(|| AccessError {
                details: Some(json!({ "class": class })),
                ..AccessError::new("not_found", "no homeroom teacher for class")
            })?;
            Ok(User {
                id: hr.id.clone(),
                name: hr.name.clone(),
                role: Role::Homeroom {
                    class: hr.class.clone(),
                },
            })
        }
    }
}

/// Who is logged in and which view they are on.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<(User, View)>,
}

impl Session {
    pub fn login(&mut self, user: User) {
        self.user = Some((user, View::Dashboard));
    }

    pub fn logout(&mut self) {
        self.user = None;
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref().map(|(u, _)| u)
    }

    pub fn view(&self) -> Option<View> {
        self.user.as_ref().map(|(_, v)| *v)
    }

    pub fn display_name(&self) -> &str {
        self.user()
            .map(|u| u.name.as_str())
            .unwrap_or(crate::audit::SYSTEM_USER)
    }

    /// Checks that the current user may act inside `view`.
    pub fn require(&self, view: View) -> Result<&User, AccessError> {
        let Some((user, _)) = self.user.as_ref() else {
            return Err(AccessError::new("not_authenticated", "log in first"));
        };
        if !is_allowed(view, &user.role) {
            return Err(AccessError {
                details: Some(json!({ "view": view })),
                ..AccessError::new("forbidden", "this role cannot access the requested view")
            });
        }
        Ok(user)
    }

    pub fn navigate(&mut self, view: View) -> Result<(), AccessError> {
        self.require(view)?;
        if let Some((_, current)) = self.user.as_mut() {
            *current = view;
        }
        Ok(())
    }

    /// Homeroom users are pinned to their own class.
    pub fn require_class(&self, class: &str) -> Result<(), AccessError> {
        match self.user().map(|u| &u.role) {
            Some(Role::Homeroom { class: own }) if own != class => Err(AccessError {
                details: Some(json!({ "class": class })),
                ..AccessError::new("forbidden", "homeroom teachers can only open their own class")
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HomeroomTeacher, Teacher};

    #[test]
    fn view_table_matches_roles() {
        let teacher = Role::Teacher { subjects: vec![] };
        let homeroom = Role::Homeroom { class: "1A".into() };
        assert!(is_allowed(View::DataManagement, &Role::Admin));
        assert!(!is_allowed(View::GradeInput, &Role::Admin));
        assert!(is_allowed(View::GradeInput, &teacher));
        assert!(!is_allowed(View::History, &teacher));
        assert!(!is_allowed(View::DataManagement, &homeroom));
        assert!(is_allowed(View::ReportCard, &homeroom));
    }

    #[test]
    fn session_navigation_refuses_forbidden_views() {
        let mut session = Session::default();
        assert_eq!(
            session.require(View::Dashboard).expect_err("anon").code,
            "not_authenticated"
        );
        session.login(User::admin());
        assert_eq!(session.view(), Some(View::Dashboard));
        session.navigate(View::History).expect("admin history");
        assert_eq!(session.view(), Some(View::History));
        let e = session.navigate(View::GradeInput).expect_err("forbidden");
        assert_eq!(e.code, "forbidden");
        assert_eq!(session.view(), Some(View::History));
        session.logout();
        assert_eq!(session.display_name(), "System");
    }

    #[test]
    fn login_builds_role_variants_from_snapshot() {
        let snap = DataSnapshot {
            teachers: vec![Teacher {
                id: "T-1".into(),
                name: "Ustadz Hasan".into(),
                subjects: vec!["Nahwu".into()],
            }],
            homeroom_teachers: vec![HomeroomTeacher {
                id: "HR-1".into(),
                name: "Ustadzah Siti".into(),
                class: "1A".into(),
                contact: String::new(),
            }],
            ..DataSnapshot::default()
        };
        let t = resolve_login(
            &snap,
            &LoginChoice::Teacher {
                teacher_id: "T-1".into(),
            },
        )
        .expect("teacher");
        assert_eq!(
            t.role,
            Role::Teacher {
                subjects: vec!["Nahwu".into()]
            }
        );
        let hr = resolve_login(&snap, &LoginChoice::Homeroom { class: "1A".into() }).expect("hr");
        let mut session = Session::default();
        session.login(hr);
        assert!(session.require_class("1A").is_ok());
        assert!(session.require_class("1B").is_err());
        assert!(resolve_login(&snap, &LoginChoice::Homeroom { class: "9Z".into() }).is_err());
    }

    #[test]
    fn user_serializes_role_inline() {
        let v = serde_json::to_value(User::admin()).expect("json");
        assert_eq!(v["role"], "admin");
        assert_eq!(v["name"], "Administrator");
    }
}
