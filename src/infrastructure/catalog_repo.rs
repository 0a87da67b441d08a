use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::catalog::{
    Book, BookChanges, BookQuery, Category, Discount, NewBook, NewDiscount, PaymentMethod,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::{books, categories, discounts, payment_methods};

use super::models::{
    BookChangeset, BookRow, CategoryRow, DiscountRow, NewBookRow, NewDiscountRow,
    PaymentMethodRow,
};

impl From<BookRow> for Book {
    fn from(r: BookRow) -> Self {
        Book {
            book_id: r.book_id,
            title: r.title,
            author: r.author,
            publisher: r.publisher,
            publication_year: r.publication_year,
            category_id: r.category_id,
            price: r.price,
            stock_quantity: r.stock_quantity,
            sold_quantity: r.sold_quantity,
            description: r.description,
            cover_image_url: r.cover_image_url,
            created_at: r.created_at,
        }
    }
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Category {
            category_id: r.category_id,
            category_name: r.category_name,
        }
    }
}

impl From<DiscountRow> for Discount {
    fn from(r: DiscountRow) -> Self {
        Discount {
            discount_id: r.discount_id,
            voucher_code: r.voucher_code,
            discount_percentage: r.discount_percentage,
            expiry_date: r.expiry_date,
            created_at: r.created_at,
        }
    }
}

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CatalogRepository for DieselCatalogRepository {
    fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>, DomainError> {
        let mut conn = self.pool.get()?;
        let mut q = books::table.into_boxed();
        if let Some(category_id) = &query.category_id {
            q = q.filter(books::category_id.eq(category_id));
        }
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            q = q.filter(
                books::title
                    .ilike(pattern.clone())
                    .or(books::author.ilike(pattern)),
            );
        }
        let rows = q
            .order(books::book_id.asc())
            .offset(query.skip)
            .limit(query.limit)
            .select(BookRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    fn find_book(&self, book_id: &str) -> Result<Option<Book>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = books::table
            .find(book_id)
            .select(BookRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Book::from))
    }

    fn insert_book(&self, book: NewBook) -> Result<Book, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(books::table)
            .values(&NewBookRow {
                book_id: &book.book_id,
                title: &book.title,
                author: &book.author,
                publisher: book.publisher.as_deref(),
                publication_year: book.publication_year,
                category_id: book.category_id.as_deref(),
                price: &book.price,
                stock_quantity: book.stock_quantity,
                description: book.description.as_deref(),
                cover_image_url: book.cover_image_url.as_deref(),
            })
            .returning(BookRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn update_book(&self, book_id: &str, changes: BookChanges) -> Result<Option<Book>, DomainError> {
        let changeset = BookChangeset {
            title: changes.title.as_deref(),
            author: changes.author.as_deref(),
            publisher: changes.publisher.as_deref(),
            publication_year: changes.publication_year,
            category_id: changes.category_id.as_deref(),
            price: changes.price.as_ref(),
            stock_quantity: changes.stock_quantity,
            description: changes.description.as_deref(),
            cover_image_url: changes.cover_image_url.as_deref(),
        };
        if changeset.is_empty() {
            return self.find_book(book_id);
        }

        let mut conn = self.pool.get()?;
        let row = diesel::update(books::table.find(book_id))
            .set(&changeset)
            .returning(BookRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Book::from))
    }

    fn delete_book(&self, book_id: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(books::table.find(book_id))
            .execute(&mut conn)
            .map_err(|e| match DomainError::from(e) {
                DomainError::Conflict(_) => {
                    DomainError::conflict(format!("book {book_id} appears in existing orders"))
                }
                other => other,
            })?;
        Ok(deleted > 0)
    }

    fn list_categories(&self, skip: i64, limit: i64) -> Result<Vec<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = categories::table
            .order(categories::category_id.asc())
            .offset(skip)
            .limit(limit)
            .select(CategoryRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    fn find_category(&self, category_id: &str) -> Result<Option<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = categories::table
            .find(category_id)
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Category::from))
    }

    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = categories::table
            .filter(categories::category_name.eq(name))
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Category::from))
    }

    fn insert_category(&self, category: Category) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(categories::table)
            .values(&CategoryRow {
                category_id: category.category_id,
                category_name: category.category_name,
            })
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn rename_category(&self, category_id: &str, name: &str) -> Result<Option<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(categories::table.find(category_id))
            .set(categories::category_name.eq(name))
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Category::from))
    }

    fn count_books_in_category(&self, category_id: &str) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        let count = books::table
            .filter(books::category_id.eq(category_id))
            .count()
            .get_result(&mut conn)?;
        Ok(count)
    }

    fn delete_category(&self, category_id: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(categories::table.find(category_id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn active_payment_methods(&self) -> Result<Vec<PaymentMethod>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = payment_methods::table
            .filter(payment_methods::status.eq("active"))
            .order(payment_methods::payment_method_id.asc())
            .select(PaymentMethodRow::as_select())
            .load(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|r| PaymentMethod {
                payment_method_id: r.payment_method_id,
                method_name: r.method_name,
                description: r.description,
                status: r.status,
            })
            .collect())
    }

    fn list_discounts(&self) -> Result<Vec<Discount>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = discounts::table
            .order(discounts::created_at.desc())
            .select(DiscountRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Discount::from).collect())
    }

    fn insert_discount(&self, discount: NewDiscount) -> Result<Discount, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(discounts::table)
            .values(&NewDiscountRow {
                discount_id: &discount.discount_id,
                voucher_code: &discount.voucher_code,
                discount_percentage: &discount.discount_percentage,
                expiry_date: discount.expiry_date,
            })
            .returning(DiscountRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderLineInput, PlaceOrder};
    use crate::domain::ports::OrderRepository;
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::testing::{seed_book, seed_customer, setup_db};
    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn list_books_filters_by_search_and_category() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool.clone());
        repo.insert_category(Category {
            category_id: "VH".to_string(),
            category_name: "Văn học".to_string(),
        })
        .unwrap();
        seed_book(&pool, "B001", 10_000, 1);
        seed_book(&pool, "B002", 10_000, 1);
        repo.update_book(
            "B002",
            BookChanges {
                category_id: Some("VH".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let all = BookQuery { limit: 20, ..Default::default() };
        assert_eq!(repo.list_books(&all).unwrap().len(), 2);

        let by_search = BookQuery {
            search: Some("b001".to_string()),
            limit: 20,
            ..Default::default()
        };
        assert_eq!(repo.list_books(&by_search).unwrap()[0].book_id, "B001");

        let by_category = BookQuery {
            category_id: Some("VH".to_string()),
            limit: 20,
            ..Default::default()
        };
        let found = repo.list_books(&by_category).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].book_id, "B002");
        assert_eq!(repo.count_books_in_category("VH").unwrap(), 1);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn deleting_an_ordered_book_is_a_conflict() {
        let (_container, pool) = setup_db().await;
        let user_id = seed_customer(&pool, "lan@example.com");
        seed_book(&pool, "B001", 10_000, 5);
        DieselOrderRepository::new(pool.clone())
            .place(
                PlaceOrder {
                    user_id,
                    shipping_address: "Hà Nội".to_string(),
                    payment_method_id: "COD".to_string(),
                    voucher_code: None,
                    lines: vec![OrderLineInput {
                        book_id: "B001".to_string(),
                        quantity: 1,
                    }],
                },
                Utc::now(),
            )
            .unwrap();
        let repo = DieselCatalogRepository::new(pool);

        let err = repo.delete_book("B001").unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn payment_methods_and_discounts() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let methods = repo.active_payment_methods().unwrap();
        let ids: Vec<_> = methods.iter().map(|m| m.payment_method_id.as_str()).collect();
        assert_eq!(ids, ["BANK", "COD"]);

        repo.insert_discount(NewDiscount {
            discount_id: "D01".to_string(),
            voucher_code: "SALE10".to_string(),
            discount_percentage: BigDecimal::from(10),
            expiry_date: Utc::now() + Duration::days(7),
        })
        .unwrap();
        let listed = repo.list_discounts().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].voucher_code, "SALE10");
    }
}
