//! Static route table

use portal_core::Role;

/// Where a redirecting entry sends the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRedirect {
    /// Fixed path
    To(&'static str),
    /// The session's landing route, or the login route without one
    Home,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub view: &'static str,
    pub title: Option<&'static str>,
    /// Roles allowed in; empty means no role restriction
    pub roles: &'static [Role],
    pub redirect: Option<RouteRedirect>,
}

impl RouteEntry {
    pub const fn view(path: &'static str, view: &'static str) -> Self {
        Self {
            path,
            view,
            title: None,
            roles: &[],
            redirect: None,
        }
    }

    pub const fn titled(mut self, title: &'static str) -> Self {
        self.title = Some(title);
        self
    }

    pub const fn roles(mut self, roles: &'static [Role]) -> Self {
        self.roles = roles;
        self
    }

    pub const fn redirect(mut self, redirect: RouteRedirect) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn allows(&self, role: Role) -> bool {
        self.is_unrestricted() || self.roles.contains(&role)
    }

    fn segments(&self) -> impl Iterator<Item = &'static str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

/// A table entry matched against a concrete path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    pub params: Vec<(String, String)>,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

const ADMIN: &[Role] = &[Role::Admin];
const TEACHER: &[Role] = &[Role::Teacher];
const STUDENT: &[Role] = &[Role::Student];

const PORTAL_ROUTES: &[RouteEntry] = &[
    RouteEntry::view("/", "Home").redirect(RouteRedirect::Home),
    RouteEntry::view("/login", "Login"),
    RouteEntry::view("/register", "Register"),
    // admin
    RouteEntry::view("/admin", "AdminLayout").redirect(RouteRedirect::To("/admin/dashboard")),
    RouteEntry::view("/admin/dashboard", "AdminDashboard").titled("Dashboard"),
    RouteEntry::view("/admin/admins", "AdminList").titled("Administrators"),
    RouteEntry::view("/admin/teachers", "TeacherList").titled("Teachers"),
    RouteEntry::view("/admin/students", "StudentList").titled("Students"),
    RouteEntry::view("/admin/colleges", "CollegeList").titled("Colleges").roles(ADMIN),
    RouteEntry::view("/admin/subjects", "SubjectList").titled("Subjects").roles(ADMIN),
    RouteEntry::view("/admin/classes", "ClassList").titled("Classes").roles(ADMIN),
    RouteEntry::view("/admin/logs", "SystemLogList").titled("System Logs").roles(ADMIN),
    // teacher
    RouteEntry::view("/teacher", "TeacherLayout"),
    RouteEntry::view("/teacher/dashboard", "TeacherDashboard").titled("Dashboard"),
    RouteEntry::view("/teacher/exams", "TeacherExamList").titled("Exams").roles(TEACHER),
    RouteEntry::view("/teacher/exams/publish-normal", "TeacherExamPublishNormal")
        .titled("Publish Exam")
        .roles(TEACHER),
    RouteEntry::view("/teacher/exams/publish-final", "TeacherExamPublishFinal")
        .titled("Publish Final Exam")
        .roles(TEACHER),
    RouteEntry::view("/teacher/exams/publish-retake", "TeacherExamPublishRetake")
        .titled("Publish Retake Exam")
        .roles(TEACHER),
    RouteEntry::view("/teacher/exams/:id", "TeacherExamDetail")
        .titled("Exam Detail")
        .roles(TEACHER),
    RouteEntry::view("/teacher/exams/:id/edit", "TeacherExamEdit")
        .titled("Edit Exam")
        .roles(TEACHER),
    RouteEntry::view("/teacher/papers", "TeacherPaperList").titled("Papers").roles(TEACHER),
    RouteEntry::view("/teacher/papers/add", "TeacherPaperAdd")
        .titled("Create Paper")
        .roles(TEACHER),
    RouteEntry::view("/teacher/papers/:id", "TeacherPaperDetail")
        .titled("Paper Detail")
        .roles(TEACHER),
    RouteEntry::view("/teacher/papers/:id/edit", "TeacherPaperEdit")
        .titled("Edit Paper")
        .roles(TEACHER),
    RouteEntry::view("/teacher/classes", "TeacherClassList").titled("Classes").roles(TEACHER),
    RouteEntry::view("/teacher/questions", "TeacherQuestionList")
        .titled("Question Bank")
        .roles(TEACHER),
    RouteEntry::view("/teacher/questions/add", "TeacherQuestionAdd")
        .titled("Add Question")
        .roles(TEACHER),
    RouteEntry::view("/teacher/questions/:id", "TeacherQuestionEdit")
        .titled("Question Detail")
        .roles(TEACHER),
    RouteEntry::view("/teacher/scores", "TeacherScoreList").titled("Scores").roles(TEACHER),
    RouteEntry::view("/teacher/scores/:examId/:classId", "TeacherScoreDetail")
        .titled("Score Detail")
        .roles(TEACHER),
    RouteEntry::view("/teacher/grading", "TeacherGradingList").titled("Grading").roles(TEACHER),
    RouteEntry::view("/teacher/grading/:examId", "TeacherGradingDetail")
        .titled("Grading Detail")
        .roles(TEACHER),
    // student
    RouteEntry::view("/student", "StudentLayout"),
    RouteEntry::view("/student/dashboard", "StudentDashboard").titled("Dashboard"),
    RouteEntry::view("/student/classes", "StudentClassList").titled("Classes").roles(STUDENT),
    RouteEntry::view("/student/exams", "StudentExamList").titled("My Exams").roles(STUDENT),
    RouteEntry::view("/student/exam-paper/:examId", "StudentExamPaper")
        .titled("Exam")
        .roles(STUDENT),
];

/// Immutable path to view mapping
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::portal()
    }
}

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    /// The portal's full route layout
    pub fn portal() -> Self {
        Self::new(PORTAL_ROUTES.to_vec())
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn get(&self, pattern: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.path == pattern)
    }

    /// Match a concrete path. Query string and fragment are ignored; when
    /// several patterns match, the one with the most literal segments wins.
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = strip_query(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut best: Option<(usize, RouteMatch<'_>)> = None;
        for entry in &self.entries {
            let pattern: Vec<&str> = entry.segments().collect();
            if pattern.len() != segments.len() {
                continue;
            }

            let mut params = Vec::new();
            let mut literals = 0;
            let matched = pattern.iter().zip(&segments).all(|(p, s)| {
                if let Some(name) = p.strip_prefix(':') {
                    params.push((name.to_string(), s.to_string()));
                    true
                } else if p == s {
                    literals += 1;
                    true
                } else {
                    false
                }
            });

            if matched && best.as_ref().map_or(true, |(score, _)| literals > *score) {
                best = Some((literals, RouteMatch { entry, params }));
            }
        }

        best.map(|(_, found)| found)
    }
}

/// Path without `?query` or `#fragment`
pub(crate) fn strip_query(path: &str) -> &str {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    &path[..end]
}
