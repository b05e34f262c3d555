//! Seed rows and the knobs that control how many of them get generated.

use karnameh_grading::SchoolYear;
use karnameh_models::{
    AssessmentEntry, AttendanceMark, ClassId, CourseId, GradeEntry, SchoolId, StudentId, TeacherId,
};

pub struct SchoolSeed {
    pub name: String,
    pub address: String,
}

pub struct ClassSeed {
    pub school_id: SchoolId,
    pub name: String,
}

pub struct TeacherSeed {
    pub school_id: SchoolId,
    pub first_name: String,
    pub last_name: String,
}

pub struct CourseSeed {
    pub school_id: SchoolId,
    pub name: String,
    pub credit_units: Option<f64>,
}

pub struct StudentSeed {
    pub school_id: SchoolId,
    pub class_id: ClassId,
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
}

/// One generated lesson for one student.
pub struct LessonSeed {
    pub school_id: SchoolId,
    pub class_id: ClassId,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub course_id: CourseId,
    pub lesson_date: String,
    pub time_slot: String,
    pub grades: Vec<GradeEntry>,
    pub assessments: Vec<AssessmentEntry>,
    pub attendance: Option<AttendanceMark>,
}

/// A class with everything needed to generate its lessons.
#[derive(Clone)]
pub struct ClassPlan {
    pub school_id: SchoolId,
    pub class_id: ClassId,
    pub students: Vec<StudentId>,
    /// (course, teacher) pairs taught to the class
    pub assignments: Vec<(CourseId, TeacherId)>,
}

#[derive(Clone)]
pub struct SeedConfig {
    pub num_schools: usize,
    pub classes_per_school: usize,
    pub students_per_class: usize,
    pub teachers_per_school: usize,
    pub courses_per_school: usize,
    /// Weeks between two lessons of the same course
    pub lesson_interval_weeks: u32,
    pub school_year: SchoolYear,
}

impl SeedConfig {
    pub fn new(num_schools: usize, school_year: SchoolYear) -> Self {
        Self {
            num_schools,
            classes_per_school: 4,
            students_per_class: 25,
            teachers_per_school: 8,
            courses_per_school: 6,
            lesson_interval_weeks: 1,
            school_year,
        }
    }

    pub fn with_classes(mut self, classes: usize, students_per_class: usize) -> Self {
        self.classes_per_school = classes;
        self.students_per_class = students_per_class;
        self
    }

    pub fn with_staff(mut self, teachers: usize, courses: usize) -> Self {
        self.teachers_per_school = teachers;
        self.courses_per_school = courses;
        self
    }

    pub fn total_students(&self) -> usize {
        self.num_schools * self.classes_per_school * self.students_per_class
    }
}
