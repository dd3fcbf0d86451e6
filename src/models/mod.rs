pub mod instructormodel;
pub mod lessonmodel;
pub mod usermodel;
