use crate::domain::errors::DomainError;
use crate::domain::ports::ReviewRepository;
use crate::domain::review::{validate_rating, NewReview, RatingSummary, Review, ReviewChanges};
use crate::domain::user::Identity;

pub struct ReviewService<R> {
    repo: R,
}

impl<R: ReviewRepository> ReviewService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    fn ensure_book(&self, book_id: &str) -> Result<(), DomainError> {
        if !self.repo.book_exists(book_id)? {
            return Err(DomainError::not_found(format!("Book {book_id}")));
        }
        Ok(())
    }

    fn owned(&self, caller: Identity, review_id: i32, allow_admin: bool) -> Result<Review, DomainError> {
        let review = self
            .repo
            .find(review_id)?
            .ok_or_else(|| DomainError::not_found(format!("Review {review_id}")))?;
        if review.user_id != caller.user_id && !(allow_admin && caller.is_admin()) {
            return Err(DomainError::forbidden("you can only change your own reviews"));
        }
        Ok(review)
    }

    pub fn list_for_book(&self, book_id: &str) -> Result<Vec<Review>, DomainError> {
        self.ensure_book(book_id)?;
        self.repo.list_for_book(book_id)
    }

    pub fn summary(&self, book_id: &str) -> Result<RatingSummary, DomainError> {
        self.ensure_book(book_id)?;
        self.repo.summary(book_id)
    }

    /// Only buyers with a non-cancelled order for the book may review it, once.
    pub fn create(
        &self,
        caller: Identity,
        book_id: &str,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, DomainError> {
        validate_rating(rating)?;
        self.ensure_book(book_id)?;
        if !self.repo.has_purchased(caller.user_id, book_id)? {
            return Err(DomainError::forbidden(
                "you can only review books you have purchased",
            ));
        }
        if self.repo.find_by_author(caller.user_id, book_id)?.is_some() {
            return Err(DomainError::conflict("you have already reviewed this book"));
        }
        self.repo.insert(NewReview {
            book_id: book_id.to_string(),
            user_id: caller.user_id,
            rating,
            comment,
        })
    }

    pub fn update(
        &self,
        caller: Identity,
        review_id: i32,
        changes: ReviewChanges,
    ) -> Result<Review, DomainError> {
        if let Some(rating) = changes.rating {
            validate_rating(rating)?;
        }
        self.owned(caller, review_id, false)?;
        self.repo.update(review_id, changes)
    }

    pub fn delete(&self, caller: Identity, review_id: i32) -> Result<(), DomainError> {
        self.owned(caller, review_id, true)?;
        self.repo.delete(review_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::user::Role;

    #[derive(Default)]
    struct FakeReviews {
        books: Vec<String>,
        purchases: Vec<(Uuid, String)>,
        rows: Mutex<Vec<Review>>,
    }

    impl ReviewRepository for FakeReviews {
        fn list_for_book(&self, book_id: &str) -> Result<Vec<Review>, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.book_id == book_id)
                .cloned()
                .collect())
        }

        fn summary(&self, _: &str) -> Result<RatingSummary, DomainError> {
            unimplemented!()
        }

        fn book_exists(&self, book_id: &str) -> Result<bool, DomainError> {
            Ok(self.books.iter().any(|b| b == book_id))
        }

        fn has_purchased(&self, user_id: Uuid, book_id: &str) -> Result<bool, DomainError> {
            Ok(self
                .purchases
                .iter()
                .any(|(u, b)| *u == user_id && b == book_id))
        }

        fn find(&self, review_id: i32) -> Result<Option<Review>, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.review_id == review_id)
                .cloned())
        }

        fn find_by_author(&self, user_id: Uuid, book_id: &str) -> Result<Option<Review>, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.user_id == user_id && r.book_id == book_id)
                .cloned())
        }

        fn insert(&self, review: NewReview) -> Result<Review, DomainError> {
            let mut rows = self.rows.lock().unwrap();
            let review = Review {
                review_id: rows.len() as i32 + 1,
                book_id: review.book_id,
                user_id: review.user_id,
                user_fullname: None,
                rating: review.rating,
                comment: review.comment,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            rows.push(review.clone());
            Ok(review)
        }

        fn update(&self, review_id: i32, changes: ReviewChanges) -> Result<Review, DomainError> {
            let mut rows = self.rows.lock().unwrap();
            let review = rows
                .iter_mut()
                .find(|r| r.review_id == review_id)
                .ok_or_else(|| DomainError::not_found("Review"))?;
            if let Some(rating) = changes.rating {
                review.rating = rating;
            }
            if let Some(comment) = changes.comment {
                review.comment = Some(comment);
            }
            Ok(review.clone())
        }

        fn delete(&self, review_id: i32) -> Result<bool, DomainError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.review_id != review_id);
            Ok(rows.len() < before)
        }
    }

    fn customer() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
        }
    }

    fn service_with_buyer(buyer: Identity) -> ReviewService<FakeReviews> {
        ReviewService::new(FakeReviews {
            books: vec!["B001".to_string(), "B002".to_string()],
            purchases: vec![(buyer.user_id, "B001".to_string())],
            ..Default::default()
        })
    }

    #[test]
    fn buyer_can_review_once() {
        let buyer = customer();
        let svc = service_with_buyer(buyer);

        let review = svc.create(buyer, "B001", 5, Some("Rất hay".to_string())).unwrap();
        assert_eq!(review.rating, 5);

        assert!(matches!(
            svc.create(buyer, "B001", 4, None).unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[test]
    fn non_buyer_is_forbidden() {
        let buyer = customer();
        let svc = service_with_buyer(buyer);

        assert!(matches!(
            svc.create(customer(), "B001", 5, None).unwrap_err(),
            DomainError::Forbidden(_)
        ));
        assert!(matches!(
            svc.create(buyer, "B002", 5, None).unwrap_err(),
            DomainError::Forbidden(_)
        ));
    }

    #[test]
    fn rating_and_book_are_validated() {
        let buyer = customer();
        let svc = service_with_buyer(buyer);

        assert!(matches!(
            svc.create(buyer, "B001", 6, None).unwrap_err(),
            DomainError::InvalidInput(_)
        ));
        assert!(matches!(
            svc.create(buyer, "B001", 0, None).unwrap_err(),
            DomainError::InvalidInput(_)
        ));
        assert!(matches!(
            svc.create(buyer, "B404", 3, None).unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn only_author_updates_but_admin_may_delete() {
        let buyer = customer();
        let svc = service_with_buyer(buyer);
        let review = svc.create(buyer, "B001", 3, None).unwrap();
        let admin = Identity {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };

        let change = ReviewChanges {
            rating: Some(4),
            comment: None,
        };
        assert!(matches!(
            svc.update(admin, review.review_id, change.clone()).unwrap_err(),
            DomainError::Forbidden(_)
        ));
        assert_eq!(svc.update(buyer, review.review_id, change).unwrap().rating, 4);

        assert!(matches!(
            svc.delete(customer(), review.review_id).unwrap_err(),
            DomainError::Forbidden(_)
        ));
        svc.delete(admin, review.review_id).unwrap();
        assert!(svc.list_for_book("B001").unwrap().is_empty());
    }
}
