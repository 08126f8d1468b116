use serde::Serialize;

use crate::forms::descriptor::{
    AssociationSpec, Cascade, Derive, FieldSpec, PickerSpec, ResourceDescriptor,
};
use crate::forms::reference::ReferenceKind;
use crate::session::Role;

pub const DEGREES: &[&str] = &["LICENCIATURA", "MAESTRIA", "DOCTORADO"];
pub const STUDENT_STATUSES: &[&str] = &["ACTIVE", "INACTIVE"];
pub const ROLES: &[&str] = &["ADMIN", "TEACHER", "STUDENT"];
pub const SHIFTS: &[&str] = &["MATUTINO", "VESPERTINO"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Users,
    Students,
    Careers,
    Subjects,
    Teachers,
    Schedules,
    Classrooms,
    Groups,
}

impl Screen {
    pub const ALL: [Screen; 8] = [
        Screen::Users,
        Screen::Students,
        Screen::Careers,
        Screen::Subjects,
        Screen::Teachers,
        Screen::Schedules,
        Screen::Classrooms,
        Screen::Groups,
    ];

    pub fn parse(s: &str) -> Option<Screen> {
        Screen::ALL.into_iter().find(|sc| sc.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        self.descriptor().name
    }

    pub fn descriptor(self) -> &'static ResourceDescriptor {
        match self {
            Screen::Users => &USERS,
            Screen::Students => &STUDENTS,
            Screen::Careers => &CAREERS,
            Screen::Subjects => &SUBJECTS,
            Screen::Teachers => &TEACHERS,
            Screen::Schedules => &SCHEDULES,
            Screen::Classrooms => &CLASSROOMS,
            Screen::Groups => &GROUPS,
        }
    }
}

/// Screens reachable from the main menu for a role.
pub fn menu(role: Role) -> &'static [Screen] {
    match role {
        Role::Admin => &Screen::ALL,
        Role::Teacher => &[Screen::Teachers],
        Role::Student => &[Screen::Students],
    }
}

pub static CAREERS: ResourceDescriptor = ResourceDescriptor {
    name: "careers",
    path: "/careers",
    noun: "career",
    fields: &[
        FieldSpec::text("name").required(),
        FieldSpec::integer("semesters").required(),
    ],
    pickers: &[],
    associations: &[],
    columns: &["id", "name", "semesters"],
    list_filter: None,
    load_from_list: true,
    self_endpoint: false,
    admin_only_delete: false,
    omit_blank_on_update: false,
    details: None,
    invalidates: &[ReferenceKind::Careers],
};

pub static SUBJECTS: ResourceDescriptor = ResourceDescriptor {
    name: "subjects",
    path: "/subjects",
    noun: "subject",
    fields: &[
        FieldSpec::text("name").required(),
        FieldSpec::integer("credits").required(),
        FieldSpec::integer("semester").required(),
    ],
    pickers: &[PickerSpec::new("career", "careerId", ReferenceKind::Careers).default_first()],
    associations: &[],
    columns: &["id", "name", "credits", "semester", "careerName"],
    list_filter: Some(("careerId", "career")),
    load_from_list: true,
    self_endpoint: false,
    admin_only_delete: false,
    omit_blank_on_update: false,
    details: None,
    invalidates: &[ReferenceKind::Subjects],
};

pub static CLASSROOMS: ResourceDescriptor = ResourceDescriptor {
    name: "classrooms",
    path: "/classrooms",
    noun: "classroom",
    fields: &[
        FieldSpec::text("name").required(),
        FieldSpec::text("building").required(),
    ],
    pickers: &[],
    associations: &[],
    columns: &["id", "name", "building"],
    list_filter: None,
    load_from_list: true,
    self_endpoint: false,
    admin_only_delete: false,
    omit_blank_on_update: false,
    details: None,
    invalidates: &[ReferenceKind::Classrooms],
};

pub static SCHEDULES: ResourceDescriptor = ResourceDescriptor {
    name: "schedules",
    path: "/schedules",
    noun: "schedule",
    fields: &[
        FieldSpec::text("time").required(),
        FieldSpec::choice("shift", SHIFTS).derived(Derive::ShiftFromTime("time")),
    ],
    pickers: &[],
    associations: &[],
    columns: &["id", "shift", "time"],
    list_filter: None,
    load_from_list: true,
    self_endpoint: false,
    admin_only_delete: false,
    omit_blank_on_update: false,
    details: None,
    invalidates: &[ReferenceKind::Schedules],
};

pub static USERS: ResourceDescriptor = ResourceDescriptor {
    name: "users",
    path: "/users",
    noun: "user",
    fields: &[
        FieldSpec::text("email").required_on_create().admin_only(),
        FieldSpec::text("username").required_on_create(),
        FieldSpec::text("password").required_on_create(),
        FieldSpec::choice("role", ROLES).required_on_create().admin_only(),
    ],
    pickers: &[],
    associations: &[],
    columns: &["id", "email", "username", "role"],
    list_filter: None,
    load_from_list: false,
    self_endpoint: false,
    admin_only_delete: true,
    omit_blank_on_update: true,
    details: None,
    invalidates: &[
        ReferenceKind::UnassignedStudentUsers,
        ReferenceKind::UnassignedTeacherUsers,
    ],
};

pub static TEACHERS: ResourceDescriptor = ResourceDescriptor {
    name: "teachers",
    path: "/teachers",
    noun: "teacher",
    fields: &[
        FieldSpec::text("email").display_only(),
        FieldSpec::text("name").required(),
        FieldSpec::choice("degree", DEGREES).required(),
    ],
    pickers: &[
        PickerSpec::new("user", "userId", ReferenceKind::UnassignedTeacherUsers)
            .inbound("user_id")
            .required_on_create()
            .admin_only()
            .pinned_from(&["email"]),
    ],
    associations: &[
        AssociationSpec::new("careers", "careerIds", ReferenceKind::Careers, "careers", "careerId")
            .admin_only(),
        AssociationSpec::new("subjects", "subjectIds", ReferenceKind::Subjects, "subjects", "subjectId")
            .cascade(Cascade::Association("careers"))
            .admin_only(),
    ],
    columns: &["id", "name", "email", "degree"],
    list_filter: None,
    load_from_list: false,
    self_endpoint: true,
    admin_only_delete: true,
    omit_blank_on_update: false,
    details: None,
    invalidates: &[ReferenceKind::Teachers, ReferenceKind::UnassignedTeacherUsers],
};

pub static STUDENTS: ResourceDescriptor = ResourceDescriptor {
    name: "students",
    path: "/students",
    noun: "student",
    fields: &[
        FieldSpec::text("email").display_only(),
        FieldSpec::text("name").required().admin_only(),
        FieldSpec::choice("status", STUDENT_STATUSES).required().admin_only(),
        FieldSpec::text("dateOfBirth").required().admin_only(),
    ],
    pickers: &[
        PickerSpec::new("user", "userId", ReferenceKind::UnassignedStudentUsers)
            .admin_only()
            .pinned_from(&["email"]),
        PickerSpec::new("career", "careerId", ReferenceKind::Careers).admin_only(),
    ],
    associations: &[
        AssociationSpec::new("subjects", "subjects", ReferenceKind::Subjects, "subjects", "subjectId")
            .cascade(Cascade::ScopedByPicker("career")),
    ],
    columns: &["id", "name", "email", "status", "career_name"],
    list_filter: None,
    load_from_list: false,
    self_endpoint: true,
    admin_only_delete: true,
    omit_blank_on_update: false,
    details: None,
    invalidates: &[ReferenceKind::UnassignedStudentUsers],
};

pub static GROUPS: ResourceDescriptor = ResourceDescriptor {
    name: "groups",
    path: "/groups",
    noun: "group",
    fields: &[
        FieldSpec::text("name").required(),
        FieldSpec::integer("semester").required(),
        FieldSpec::integer("maxStudents").required(),
    ],
    pickers: &[
        PickerSpec::new("career", "careerId", ReferenceKind::Careers),
        PickerSpec::new("subject", "subjectId", ReferenceKind::Subjects)
            .cascade(Cascade::Picker("career")),
        PickerSpec::new("teacher", "teacherId", ReferenceKind::Teachers),
        PickerSpec::new("classroom", "classroomId", ReferenceKind::Classrooms),
        PickerSpec::new("schedule", "scheduleId", ReferenceKind::Schedules),
    ],
    associations: &[],
    columns: &["id", "name", "careerName", "subjectName", "teacherName", "scheduleTime"],
    list_filter: None,
    load_from_list: false,
    self_endpoint: false,
    admin_only_delete: false,
    omit_blank_on_update: false,
    details: Some("students"),
    invalidates: &[],
};
