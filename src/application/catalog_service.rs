use chrono::Utc;

use crate::domain::catalog::{
    Book, BookChanges, BookQuery, Category, Discount, NewBook, NewDiscount, PaymentMethod,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;

pub struct CatalogService<C> {
    repo: C,
}

impl<C: CatalogRepository> CatalogService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    fn ensure_category(&self, category_id: Option<&str>) -> Result<(), DomainError> {
        if let Some(id) = category_id {
            if self.repo.find_category(id)?.is_none() {
                return Err(DomainError::not_found(format!("Category {id}")));
            }
        }
        Ok(())
    }

    // ── Books ───────────────────────────────────────────────────────────────

    pub fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>, DomainError> {
        self.repo.list_books(query)
    }

    pub fn get_book(&self, book_id: &str) -> Result<Book, DomainError> {
        self.repo
            .find_book(book_id)?
            .ok_or_else(|| DomainError::not_found(format!("Book {book_id}")))
    }

    pub fn create_book(&self, book: NewBook) -> Result<Book, DomainError> {
        book.validate()?;
        if self.repo.find_book(&book.book_id)?.is_some() {
            return Err(DomainError::conflict(format!(
                "book {} already exists",
                book.book_id
            )));
        }
        self.ensure_category(book.category_id.as_deref())?;
        let book = self.repo.insert_book(book)?;
        log::info!("Book {} added", book.book_id);
        Ok(book)
    }

    pub fn update_book(&self, book_id: &str, changes: BookChanges) -> Result<Book, DomainError> {
        changes.validate()?;
        self.ensure_category(changes.category_id.as_deref())?;
        self.repo
            .update_book(book_id, changes)?
            .ok_or_else(|| DomainError::not_found(format!("Book {book_id}")))
    }

    pub fn delete_book(&self, book_id: &str) -> Result<(), DomainError> {
        if !self.repo.delete_book(book_id)? {
            return Err(DomainError::not_found(format!("Book {book_id}")));
        }
        log::info!("Book {book_id} deleted");
        Ok(())
    }

    // ── Categories ──────────────────────────────────────────────────────────

    pub fn list_categories(&self, skip: i64, limit: i64) -> Result<Vec<Category>, DomainError> {
        self.repo.list_categories(skip, limit)
    }

    pub fn get_category(&self, category_id: &str) -> Result<Category, DomainError> {
        self.repo
            .find_category(category_id)?
            .ok_or_else(|| DomainError::not_found(format!("Category {category_id}")))
    }

    pub fn create_category(&self, category: Category) -> Result<Category, DomainError> {
        category.validate()?;
        if self.repo.find_category(&category.category_id)?.is_some() {
            return Err(DomainError::conflict(format!(
                "category {} already exists",
                category.category_id
            )));
        }
        if self.repo.find_category_by_name(&category.category_name)?.is_some() {
            return Err(DomainError::conflict(format!(
                "category name '{}' is taken",
                category.category_name
            )));
        }
        self.repo.insert_category(category)
    }

    pub fn rename_category(&self, category_id: &str, name: &str) -> Result<Category, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid("category_name is required"));
        }
        if let Some(other) = self.repo.find_category_by_name(name)? {
            if other.category_id != category_id {
                return Err(DomainError::conflict(format!("category name '{name}' is taken")));
            }
        }
        self.repo
            .rename_category(category_id, name)?
            .ok_or_else(|| DomainError::not_found(format!("Category {category_id}")))
    }

    pub fn delete_category(&self, category_id: &str) -> Result<(), DomainError> {
        self.get_category(category_id)?;
        let books = self.repo.count_books_in_category(category_id)?;
        if books > 0 {
            return Err(DomainError::conflict(format!(
                "category {category_id} still has {books} book(s)"
            )));
        }
        self.repo.delete_category(category_id)?;
        Ok(())
    }

    // ── Payment methods & discounts ─────────────────────────────────────────

    pub fn payment_methods(&self) -> Result<Vec<PaymentMethod>, DomainError> {
        self.repo.active_payment_methods()
    }

    pub fn list_discounts(&self) -> Result<Vec<Discount>, DomainError> {
        self.repo.list_discounts()
    }

    pub fn create_discount(&self, discount: NewDiscount) -> Result<Discount, DomainError> {
        discount.validate(Utc::now())?;
        self.repo.insert_discount(discount)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bigdecimal::BigDecimal;

    use super::*;

    #[derive(Default)]
    struct MemoryCatalog {
        categories: Mutex<Vec<Category>>,
        books: Mutex<Vec<Book>>,
    }

    impl CatalogRepository for MemoryCatalog {
        fn list_books(&self, _: &BookQuery) -> Result<Vec<Book>, DomainError> {
            Ok(self.books.lock().unwrap().clone())
        }

        fn find_book(&self, book_id: &str) -> Result<Option<Book>, DomainError> {
            Ok(self.books.lock().unwrap().iter().find(|b| b.book_id == book_id).cloned())
        }

        fn insert_book(&self, book: NewBook) -> Result<Book, DomainError> {
            let book = Book {
                book_id: book.book_id,
                title: book.title,
                author: book.author,
                publisher: book.publisher,
                publication_year: book.publication_year,
                category_id: book.category_id,
                price: book.price,
                stock_quantity: book.stock_quantity,
                sold_quantity: 0,
                description: book.description,
                cover_image_url: book.cover_image_url,
                created_at: Utc::now(),
            };
            self.books.lock().unwrap().push(book.clone());
            Ok(book)
        }

        fn update_book(&self, book_id: &str, changes: BookChanges) -> Result<Option<Book>, DomainError> {
            let mut books = self.books.lock().unwrap();
            let Some(book) = books.iter_mut().find(|b| b.book_id == book_id) else {
                return Ok(None);
            };
            if let Some(category_id) = changes.category_id {
                book.category_id = Some(category_id);
            }
            Ok(Some(book.clone()))
        }

        fn delete_book(&self, book_id: &str) -> Result<bool, DomainError> {
            let mut books = self.books.lock().unwrap();
            let before = books.len();
            books.retain(|b| b.book_id != book_id);
            Ok(books.len() < before)
        }

        fn list_categories(&self, _: i64, _: i64) -> Result<Vec<Category>, DomainError> {
            Ok(self.categories.lock().unwrap().clone())
        }

        fn find_category(&self, id: &str) -> Result<Option<Category>, DomainError> {
            Ok(self.categories.lock().unwrap().iter().find(|c| c.category_id == id).cloned())
        }

        fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, DomainError> {
            Ok(self
                .categories
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.category_name == name)
                .cloned())
        }

        fn insert_category(&self, category: Category) -> Result<Category, DomainError> {
            self.categories.lock().unwrap().push(category.clone());
            Ok(category)
        }

        fn rename_category(&self, id: &str, name: &str) -> Result<Option<Category>, DomainError> {
            let mut categories = self.categories.lock().unwrap();
            Ok(categories.iter_mut().find(|c| c.category_id == id).map(|c| {
                c.category_name = name.to_string();
                c.clone()
            }))
        }

        fn count_books_in_category(&self, id: &str) -> Result<i64, DomainError> {
            Ok(self
                .books
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.category_id.as_deref() == Some(id))
                .count() as i64)
        }

        fn delete_category(&self, id: &str) -> Result<bool, DomainError> {
            let mut categories = self.categories.lock().unwrap();
            let before = categories.len();
            categories.retain(|c| c.category_id != id);
            Ok(categories.len() < before)
        }

        fn active_payment_methods(&self) -> Result<Vec<PaymentMethod>, DomainError> {
            Ok(Vec::new())
        }

        fn list_discounts(&self) -> Result<Vec<Discount>, DomainError> {
            Ok(Vec::new())
        }

        fn insert_discount(&self, d: NewDiscount) -> Result<Discount, DomainError> {
            Ok(Discount {
                discount_id: d.discount_id,
                voucher_code: d.voucher_code,
                discount_percentage: d.discount_percentage,
                expiry_date: d.expiry_date,
                created_at: Utc::now(),
            })
        }
    }

    fn category(id: &str, name: &str) -> Category {
        Category {
            category_id: id.to_string(),
            category_name: name.to_string(),
        }
    }

    fn book(id: &str, category_id: Option<&str>) -> NewBook {
        NewBook {
            book_id: id.to_string(),
            title: "Số đỏ".to_string(),
            author: "Vũ Trọng Phụng".to_string(),
            publisher: None,
            publication_year: Some(1936),
            category_id: category_id.map(str::to_string),
            price: BigDecimal::from(75_000),
            stock_quantity: 3,
            description: None,
            cover_image_url: None,
        }
    }

    #[test]
    fn book_needs_an_existing_category() {
        let svc = CatalogService::new(MemoryCatalog::default());
        assert!(matches!(
            svc.create_book(book("B001", Some("VH"))).unwrap_err(),
            DomainError::NotFound(_)
        ));

        svc.create_category(category("VH", "Văn học")).unwrap();
        assert!(svc.create_book(book("B001", Some("VH"))).is_ok());
        assert!(matches!(
            svc.create_book(book("B001", None)).unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[test]
    fn category_with_books_cannot_be_deleted() {
        let svc = CatalogService::new(MemoryCatalog::default());
        svc.create_category(category("VH", "Văn học")).unwrap();
        svc.create_book(book("B001", Some("VH"))).unwrap();

        assert!(matches!(
            svc.delete_category("VH").unwrap_err(),
            DomainError::Conflict(_)
        ));
        svc.delete_book("B001").unwrap();
        assert!(svc.delete_category("VH").is_ok());
        assert!(matches!(
            svc.delete_category("VH").unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn category_names_stay_unique() {
        let svc = CatalogService::new(MemoryCatalog::default());
        svc.create_category(category("VH", "Văn học")).unwrap();
        svc.create_category(category("KT", "Kinh tế")).unwrap();

        assert!(matches!(
            svc.create_category(category("VH2", "Văn học")).unwrap_err(),
            DomainError::Conflict(_)
        ));
        assert!(matches!(
            svc.rename_category("KT", "Văn học").unwrap_err(),
            DomainError::Conflict(_)
        ));
        assert_eq!(svc.rename_category("VH", "Văn học").unwrap().category_name, "Văn học");
        assert!(matches!(
            svc.rename_category("XX", "Khác").unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn expired_discount_is_rejected() {
        let svc = CatalogService::new(MemoryCatalog::default());
        let err = svc
            .create_discount(NewDiscount {
                discount_id: "D01".to_string(),
                voucher_code: "OLD".to_string(),
                discount_percentage: BigDecimal::from(10),
                expiry_date: Utc::now() - chrono::Duration::days(1),
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
