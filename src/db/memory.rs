use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InstructorExt, LessonExt, StoreError, UserExt};
use crate::models::{
    instructormodel::{
        InstructorDetails, InstructorFilter, InstructorOrder, InstructorProfile,
        InstructorProfileUpdate, NewInstructorProfile, NewVehicle, VerificationStatus, Vehicle,
    },
    lessonmodel::{
        InstructorWithUser, Lesson, LessonDetails, LessonScope, LessonStatus, LessonUpdate,
        NewLesson, StudentWithUser,
    },
    usermodel::{NewStudentProfile, NewUser, StudentProfile, User, UserRole, UserWithProfiles},
};

/// Named writes a test can make fail once, to observe rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePoint {
    InsertUser,
    InsertStudentProfile,
    InsertInstructorProfile,
    ReplaceVehicles,
    UpdateInstructorStatus,
    UpdateUserRole,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    students: HashMap<Uuid, StudentProfile>,
    instructors: HashMap<Uuid, InstructorProfile>,
    vehicles: Vec<Vehicle>,
    lessons: HashMap<Uuid, Lesson>,
    last: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    fault: Option<WritePoint>,
}

/// In-process store with the same contract as the Postgres client.
///
/// Every write runs against a staged copy of the tables that replaces the
/// live copy only when the whole operation succeeds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl Tables {
    // Strictly increasing so ordering by timestamp is deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last = Some(next);
        next
    }

    fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email == email)
    }

    fn student_by_user(&self, user_id: Uuid) -> Option<&StudentProfile> {
        self.students.values().find(|s| s.user_id == user_id)
    }

    fn instructor_by_user(&self, user_id: Uuid) -> Option<&InstructorProfile> {
        self.instructors.values().find(|i| i.user_id == user_id)
    }

    fn instructor_details(&self, profile: &InstructorProfile) -> InstructorDetails {
        let mut vehicles: Vec<Vehicle> = self
            .vehicles
            .iter()
            .filter(|v| v.instructor_id == profile.id)
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| b.year.cmp(&a.year));

        InstructorDetails {
            profile: profile.clone(),
            user: self.users.get(&profile.user_id).cloned(),
            vehicles,
        }
    }

    fn lesson_details(&self, lesson: &Lesson) -> LessonDetails {
        LessonDetails {
            student: self
                .students
                .get(&lesson.student_id)
                .map(|s| StudentWithUser {
                    profile: s.clone(),
                    user: self.users.get(&s.user_id).cloned(),
                }),
            instructor: self
                .instructors
                .get(&lesson.instructor_id)
                .map(|i| InstructorWithUser {
                    profile: i.clone(),
                    user: self.users.get(&i.user_id).cloned(),
                }),
            lesson: lesson.clone(),
        }
    }
}

/// A staged copy of the tables plus the pending fault, if any.
struct Tx<'a> {
    tables: Tables,
    fault: &'a mut Option<WritePoint>,
}

impl Tx<'_> {
    fn write_point(&mut self, point: WritePoint) -> Result<(), StoreError> {
        if *self.fault == Some(point) {
            *self.fault = None;
            return Err(StoreError::WriteFailed(format!("{:?}", point)));
        }
        Ok(())
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        self.write_point(WritePoint::InsertUser)?;

        if self.tables.user_by_email(&user.email).is_some() {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = self.tables.tick();
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password: user.password_hash,
            name: user.name,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        self.tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn insert_student(
        &mut self,
        user_id: Uuid,
        profile: NewStudentProfile,
    ) -> Result<StudentProfile, StoreError> {
        self.write_point(WritePoint::InsertStudentProfile)?;

        if self.tables.student_by_user(user_id).is_some() {
            return Err(StoreError::UniqueViolation(
                "student_profiles_user_id_key".to_string(),
            ));
        }
        if self.tables.students.values().any(|s| s.cpf == profile.cpf) {
            return Err(StoreError::UniqueViolation(
                "student_profiles_cpf_key".to_string(),
            ));
        }

        let now = self.tables.tick();
        let profile = StudentProfile {
            id: Uuid::new_v4(),
            user_id,
            cpf: profile.cpf,
            phone: profile.phone,
            created_at: now,
            updated_at: now,
        };
        self.tables.students.insert(profile.id, profile.clone());
        Ok(profile)
    }

    fn ensure_instructor_cpf_free(&self, cpf: &str, owner: Uuid) -> Result<(), StoreError> {
        if self
            .tables
            .instructors
            .values()
            .any(|i| i.cpf == cpf && i.user_id != owner)
        {
            return Err(StoreError::UniqueViolation(
                "instructor_profiles_cpf_key".to_string(),
            ));
        }
        Ok(())
    }

    fn insert_instructor(
        &mut self,
        user_id: Uuid,
        profile: NewInstructorProfile,
    ) -> Result<InstructorProfile, StoreError> {
        self.write_point(WritePoint::InsertInstructorProfile)?;

        if self.tables.instructor_by_user(user_id).is_some() {
            return Err(StoreError::UniqueViolation(
                "instructor_profiles_user_id_key".to_string(),
            ));
        }
        self.ensure_instructor_cpf_free(&profile.cpf, user_id)?;

        let now = self.tables.tick();
        let profile = InstructorProfile {
            id: Uuid::new_v4(),
            user_id,
            cpf: profile.cpf,
            credential_number: profile.credential_number,
            phone: profile.phone,
            price_per_hour: profile.price_per_hour,
            categories: profile.categories,
            bio: profile.bio,
            address: profile.address,
            latitude: profile.latitude,
            longitude: profile.longitude,
            verification_status: profile.verification_status,
            rejection_reason: None,
            rejection_notes: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.instructors.insert(profile.id, profile.clone());
        Ok(profile)
    }

    fn upsert_pending_instructor(
        &mut self,
        user_id: Uuid,
        profile: NewInstructorProfile,
    ) -> Result<InstructorProfile, StoreError> {
        let existing = self.tables.instructor_by_user(user_id).map(|i| i.id);
        let Some(profile_id) = existing else {
            return self.insert_instructor(
                user_id,
                NewInstructorProfile {
                    verification_status: VerificationStatus::Pending,
                    ..profile
                },
            );
        };

        self.write_point(WritePoint::UpdateInstructorStatus)?;
        self.ensure_instructor_cpf_free(&profile.cpf, user_id)?;

        let now = self.tables.tick();
        let current = self
            .tables
            .instructors
            .get_mut(&profile_id)
            .ok_or(StoreError::NotFound("instructor profile"))?;

        current.cpf = profile.cpf;
        current.credential_number = profile.credential_number;
        current.phone = profile.phone;
        current.price_per_hour = profile.price_per_hour;
        current.categories = profile.categories;
        current.bio = profile.bio;
        current.address = profile.address;
        current.latitude = profile.latitude;
        current.longitude = profile.longitude;
        current.verification_status = VerificationStatus::Pending;
        current.rejection_reason = None;
        current.rejection_notes = None;
        current.updated_at = now;

        Ok(current.clone())
    }

    fn insert_vehicles(&mut self, instructor_id: Uuid, vehicles: Vec<NewVehicle>) {
        for vehicle in vehicles {
            self.tables.vehicles.push(Vehicle {
                id: Uuid::new_v4(),
                instructor_id,
                brand: vehicle.brand,
                model: vehicle.model,
                year: vehicle.year,
                plate: vehicle.plate,
                transmission: vehicle.transmission,
                is_adapted: vehicle.is_adapted,
            });
        }
    }

    fn replace_vehicles(
        &mut self,
        instructor_id: Uuid,
        vehicles: Vec<NewVehicle>,
    ) -> Result<(), StoreError> {
        self.write_point(WritePoint::ReplaceVehicles)?;
        self.tables
            .vehicles
            .retain(|v| v.instructor_id != instructor_id);
        self.insert_vehicles(instructor_id, vehicles);
        Ok(())
    }

    fn set_instructor_status(
        &mut self,
        user_id: Uuid,
        status: VerificationStatus,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Result<InstructorProfile, StoreError> {
        self.write_point(WritePoint::UpdateInstructorStatus)?;

        let profile_id = self
            .tables
            .instructor_by_user(user_id)
            .map(|i| i.id)
            .ok_or(StoreError::NotFound("instructor profile"))?;
        let now = self.tables.tick();
        let profile = self
            .tables
            .instructors
            .get_mut(&profile_id)
            .ok_or(StoreError::NotFound("instructor profile"))?;

        if !profile.verification_status.can_review_to(status) {
            return Err(StoreError::InvalidTransition(
                profile.verification_status.transition_error(status),
            ));
        }

        profile.verification_status = status;
        profile.rejection_reason = reason;
        profile.rejection_notes = notes;
        profile.updated_at = now;

        Ok(profile.clone())
    }

    fn set_user_role(&mut self, user_id: Uuid, role: UserRole) -> Result<User, StoreError> {
        self.write_point(WritePoint::UpdateUserRole)?;

        let now = self.tables.tick();
        let user = self
            .tables
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("user"))?;
        user.role = role;
        user.updated_at = now;

        Ok(user.clone())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot failure at `point`. The next write reaching it fails
    /// and the surrounding operation leaves no trace.
    #[cfg(test)]
    pub async fn inject_fault(&self, point: WritePoint) {
        self.state.write().await.fault = Some(point);
    }

    async fn transaction<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnOnce(&mut Tx<'_>) -> Result<T, StoreError> + Send,
    {
        let mut guard = self.state.write().await;
        let State { tables, fault } = &mut *guard;

        let mut tx = Tx {
            tables: tables.clone(),
            fault,
        };
        let out = f(&mut tx)?;

        let Tx { tables: staged, .. } = tx;
        *tables = staged;

        Ok(out)
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        let tables = &state.tables;

        let user = if let Some(user_id) = user_id {
            tables.users.get(&user_id).cloned()
        } else if let Some(email) = email {
            tables.user_by_email(email).cloned()
        } else {
            None
        };

        Ok(user)
    }

    async fn get_user_with_profiles(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserWithProfiles>, StoreError> {
        let state = self.state.read().await;
        let tables = &state.tables;

        Ok(tables.users.get(&user_id).map(|user| UserWithProfiles {
            user: user.clone(),
            student_profile: tables.student_by_user(user_id).cloned(),
            instructor_profile: tables
                .instructor_by_user(user_id)
                .map(|p| tables.instructor_details(p)),
        }))
    }

    async fn get_student_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentProfile>, StoreError> {
        let state = self.state.read().await;
        Ok(state.tables.student_by_user(user_id).cloned())
    }

    async fn get_student_profile_by_cpf(
        &self,
        cpf: &str,
    ) -> Result<Option<StudentProfile>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .tables
            .students
            .values()
            .find(|s| s.cpf == cpf)
            .cloned())
    }

    async fn save_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.transaction(move |tx| tx.insert_user(user)).await
    }

    async fn save_student(
        &self,
        user: NewUser,
        profile: NewStudentProfile,
    ) -> Result<(User, StudentProfile), StoreError> {
        self.transaction(move |tx| {
            let user = tx.insert_user(user)?;
            let profile = tx.insert_student(user.id, profile)?;
            Ok((user, profile))
        })
        .await
    }
}

#[async_trait]
impl InstructorExt for MemoryStore {
    async fn get_instructor_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<InstructorProfile>, StoreError> {
        let state = self.state.read().await;
        Ok(state.tables.instructor_by_user(user_id).cloned())
    }

    async fn get_instructor_profile_by_cpf(
        &self,
        cpf: &str,
    ) -> Result<Option<InstructorProfile>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .tables
            .instructors
            .values()
            .find(|i| i.cpf == cpf)
            .cloned())
    }

    async fn get_instructor(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<InstructorDetails>, StoreError> {
        let state = self.state.read().await;
        let tables = &state.tables;
        Ok(tables
            .instructors
            .get(&profile_id)
            .map(|p| tables.instructor_details(p)))
    }

    async fn get_instructor_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<InstructorDetails>, StoreError> {
        let state = self.state.read().await;
        let tables = &state.tables;
        Ok(tables
            .instructor_by_user(user_id)
            .map(|p| tables.instructor_details(p)))
    }

    async fn list_instructors(
        &self,
        filter: &InstructorFilter,
    ) -> Result<Vec<InstructorDetails>, StoreError> {
        let state = self.state.read().await;
        let tables = &state.tables;

        let mut found: Vec<InstructorDetails> = tables
            .instructors
            .values()
            .map(|p| tables.instructor_details(p))
            .filter(|d| filter.matches(d))
            .collect();
        found.sort_by(|a, b| b.profile.created_at.cmp(&a.profile.created_at));

        Ok(found)
    }

    async fn list_instructors_by_status(
        &self,
        status: VerificationStatus,
        order: InstructorOrder,
    ) -> Result<Vec<InstructorDetails>, StoreError> {
        let state = self.state.read().await;
        let tables = &state.tables;

        let mut found: Vec<InstructorDetails> = tables
            .instructors
            .values()
            .filter(|p| p.verification_status == status)
            .map(|p| tables.instructor_details(p))
            .collect();

        match order {
            InstructorOrder::CreatedDesc => {
                found.sort_by(|a, b| b.profile.created_at.cmp(&a.profile.created_at))
            }
            InstructorOrder::UpdatedDesc => {
                found.sort_by(|a, b| b.profile.updated_at.cmp(&a.profile.updated_at))
            }
        }

        Ok(found)
    }

    async fn save_instructor(
        &self,
        user: NewUser,
        profile: NewInstructorProfile,
        vehicles: Vec<NewVehicle>,
    ) -> Result<InstructorDetails, StoreError> {
        self.transaction(move |tx| {
            let user = tx.insert_user(NewUser {
                role: UserRole::Instructor,
                ..user
            })?;
            let profile = tx.insert_instructor(user.id, profile)?;
            tx.insert_vehicles(profile.id, vehicles);
            Ok(tx.tables.instructor_details(&profile))
        })
        .await
    }

    async fn upsert_verification_request(
        &self,
        user_id: Uuid,
        profile: NewInstructorProfile,
        vehicles: Option<Vec<NewVehicle>>,
    ) -> Result<InstructorDetails, StoreError> {
        self.transaction(move |tx| {
            if !tx.tables.users.contains_key(&user_id) {
                return Err(StoreError::NotFound("user"));
            }
            let profile = tx.upsert_pending_instructor(user_id, profile)?;
            if let Some(vehicles) = vehicles {
                tx.replace_vehicles(profile.id, vehicles)?;
            }
            Ok(tx.tables.instructor_details(&profile))
        })
        .await
    }

    async fn update_instructor_profile(
        &self,
        user_id: Uuid,
        update: InstructorProfileUpdate,
    ) -> Result<Option<InstructorProfile>, StoreError> {
        self.transaction(move |tx| {
            let Some(profile_id) = tx.tables.instructor_by_user(user_id).map(|i| i.id) else {
                return Ok(None);
            };
            let now = tx.tables.tick();
            let Some(profile) = tx.tables.instructors.get_mut(&profile_id) else {
                return Ok(None);
            };

            if let Some(v) = update.credential_number {
                profile.credential_number = Some(v);
            }
            if let Some(v) = update.phone {
                profile.phone = Some(v);
            }
            if let Some(v) = update.price_per_hour {
                profile.price_per_hour = v;
            }
            if let Some(v) = update.categories {
                profile.categories = v;
            }
            if let Some(v) = update.bio {
                profile.bio = Some(v);
            }
            if let Some(v) = update.address {
                profile.address = Some(v);
            }
            if let Some(v) = update.latitude {
                profile.latitude = Some(v);
            }
            if let Some(v) = update.longitude {
                profile.longitude = Some(v);
            }
            profile.updated_at = now;

            Ok(Some(profile.clone()))
        })
        .await
    }

    async fn approve_instructor(
        &self,
        user_id: Uuid,
    ) -> Result<(User, InstructorProfile), StoreError> {
        self.transaction(move |tx| {
            let profile =
                tx.set_instructor_status(user_id, VerificationStatus::Approved, None, None)?;
            let user = tx.set_user_role(user_id, UserRole::Instructor)?;
            Ok((user, profile))
        })
        .await
    }

    async fn reject_instructor(
        &self,
        user_id: Uuid,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<InstructorProfile, StoreError> {
        let reason = reason.to_string();
        let notes = notes.map(str::to_string);
        self.transaction(move |tx| {
            tx.set_instructor_status(user_id, VerificationStatus::Rejected, Some(reason), notes)
        })
        .await
    }
}

#[async_trait]
impl LessonExt for MemoryStore {
    async fn save_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        self.transaction(move |tx| {
            if !tx.tables.students.contains_key(&lesson.student_id) {
                return Err(StoreError::NotFound("student profile"));
            }
            if !tx.tables.instructors.contains_key(&lesson.instructor_id) {
                return Err(StoreError::NotFound("instructor profile"));
            }

            let now = tx.tables.tick();
            let lesson = Lesson {
                id: Uuid::new_v4(),
                student_id: lesson.student_id,
                instructor_id: lesson.instructor_id,
                scheduled_at: lesson.scheduled_at,
                duration: lesson.duration,
                status: LessonStatus::Pending,
                notes: lesson.notes,
                created_at: now,
                updated_at: now,
            };
            tx.tables.lessons.insert(lesson.id, lesson.clone());
            Ok(lesson)
        })
        .await
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> Result<Option<LessonDetails>, StoreError> {
        let state = self.state.read().await;
        let tables = &state.tables;
        Ok(tables
            .lessons
            .get(&lesson_id)
            .map(|l| tables.lesson_details(l)))
    }

    async fn list_lessons(&self, scope: &LessonScope) -> Result<Vec<LessonDetails>, StoreError> {
        let state = self.state.read().await;
        let tables = &state.tables;

        let mut lessons: Vec<&Lesson> = tables
            .lessons
            .values()
            .filter(|l| scope.includes(l))
            .collect();
        lessons.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));

        Ok(lessons.into_iter().map(|l| tables.lesson_details(l)).collect())
    }

    async fn update_lesson(
        &self,
        lesson_id: Uuid,
        update: LessonUpdate,
    ) -> Result<Option<Lesson>, StoreError> {
        self.transaction(move |tx| {
            let now = tx.tables.tick();
            let Some(lesson) = tx.tables.lessons.get_mut(&lesson_id) else {
                return Ok(None);
            };

            if let Some(v) = update.scheduled_at {
                lesson.scheduled_at = v;
            }
            if let Some(v) = update.duration {
                lesson.duration = v;
            }
            if let Some(v) = update.status {
                lesson.status = v;
            }
            if let Some(v) = update.notes {
                lesson.notes = Some(v);
            }
            lesson.updated_at = now;

            Ok(Some(lesson.clone()))
        })
        .await
    }

    async fn delete_lesson(&self, lesson_id: Uuid) -> Result<bool, StoreError> {
        self.transaction(move |tx| Ok(tx.tables.lessons.remove(&lesson_id).is_some()))
            .await
    }
}
