//! Database model types for Diesel ORM.
//!
//! Monetary values and dates are stored as TEXT: decimals in normalized
//! string form, dates as ISO 8601.

use diesel::prelude::*;

use super::schema::{closed_options, closed_stocks, option_positions, stock_positions};

/// Database row for a blended stock lot.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = stock_positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StockLotRow {
    pub user_id: i64,
    pub ticker: String,
    pub quantity: String,
    pub cost_basis: String,
    pub open_date: String,
}

/// Database row for an option position (insertable).
#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = option_positions)]
pub struct NewOptionPositionRow {
    pub user_id: i64,
    pub ticker: String,
    pub price: String,
    pub premium: String,
    pub strike: String,
    pub expiration: String,
    pub kind: String,
    pub collateral: String,
    pub quantity: String,
    pub purchase_date: String,
}

/// Database row for an option position (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = option_positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OptionPositionRow {
    pub id: i64,
    pub user_id: i64,
    pub ticker: String,
    pub price: String,
    pub premium: String,
    pub strike: String,
    pub expiration: String,
    pub kind: String,
    pub collateral: String,
    pub quantity: String,
    pub purchase_date: String,
}

/// Database row for a closed stock sale (insertable).
#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = closed_stocks)]
pub struct NewClosedStockRow {
    pub user_id: i64,
    pub ticker: String,
    pub open_date: String,
    pub close_date: String,
    pub quantity: String,
    pub cost_basis: String,
    pub sell_price: String,
    pub profit_loss: String,
}

/// Database row for a closed stock sale (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = closed_stocks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClosedStockRow {
    pub id: i64,
    pub user_id: i64,
    pub ticker: String,
    pub open_date: String,
    pub close_date: String,
    pub quantity: String,
    pub cost_basis: String,
    pub sell_price: String,
    pub profit_loss: String,
}

/// Database row for a closed option (insertable).
#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = closed_options)]
pub struct NewClosedOptionRow {
    pub user_id: i64,
    pub ticker: String,
    pub price: String,
    pub premium: String,
    pub strike: String,
    pub expiration: String,
    pub kind: String,
    pub collateral: String,
    pub quantity: String,
    pub purchase_date: String,
    pub close_date: String,
    pub sell_price: String,
    pub profit_loss: String,
}

/// Database row for a closed option (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = closed_options)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClosedOptionRow {
    pub id: i64,
    pub user_id: i64,
    pub ticker: String,
    pub price: String,
    pub premium: String,
    pub strike: String,
    pub expiration: String,
    pub kind: String,
    pub collateral: String,
    pub quantity: String,
    pub purchase_date: String,
    pub close_date: String,
    pub sell_price: String,
    pub profit_loss: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};

    #[test]
    fn stock_lot_row_roundtrip_with_db() {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();
        let mut conn = pool.get().unwrap();

        let row = StockLotRow {
            user_id: 1,
            ticker: "AAPL".to_string(),
            quantity: "100".to_string(),
            cost_basis: "150.25".to_string(),
            open_date: "2024-01-02".to_string(),
        };

        diesel::insert_into(stock_positions::table)
            .values(&row)
            .execute(&mut conn)
            .unwrap();

        let loaded: StockLotRow = stock_positions::table
            .find((1_i64, "AAPL"))
            .first(&mut conn)
            .unwrap();

        assert_eq!(loaded.quantity, "100");
        assert_eq!(loaded.cost_basis, "150.25");
    }

    #[test]
    fn option_position_row_gets_rowid_on_insert() {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();
        let mut conn = pool.get().unwrap();

        let row = NewOptionPositionRow {
            user_id: 1,
            ticker: "AAPL".to_string(),
            price: "1.5".to_string(),
            premium: "1.5".to_string(),
            strike: "50".to_string(),
            expiration: "2024-06-21".to_string(),
            kind: "CSP".to_string(),
            collateral: "5000".to_string(),
            quantity: "1".to_string(),
            purchase_date: "2024-05-01".to_string(),
        };

        diesel::insert_into(option_positions::table)
            .values(&row)
            .execute(&mut conn)
            .unwrap();

        let loaded: OptionPositionRow = option_positions::table
            .order(option_positions::id.desc())
            .first(&mut conn)
            .unwrap();

        assert!(loaded.id > 0);
        assert_eq!(loaded.kind, "CSP");
    }

    #[test]
    fn closed_rows_are_insertable() {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();
        let mut conn = pool.get().unwrap();

        let stock = NewClosedStockRow {
            user_id: 1,
            ticker: "AAPL".to_string(),
            open_date: "2024-01-02".to_string(),
            close_date: "2024-03-01".to_string(),
            quantity: "150".to_string(),
            cost_basis: "160".to_string(),
            sell_price: "180".to_string(),
            profit_loss: "3000".to_string(),
        };
        diesel::insert_into(closed_stocks::table)
            .values(&stock)
            .execute(&mut conn)
            .unwrap();

        let option = NewClosedOptionRow {
            user_id: 1,
            ticker: "AAPL".to_string(),
            price: "1.5".to_string(),
            premium: "1.5".to_string(),
            strike: "50".to_string(),
            expiration: "2024-06-21".to_string(),
            kind: "CSP".to_string(),
            collateral: "5000".to_string(),
            quantity: "1".to_string(),
            purchase_date: "2024-05-01".to_string(),
            close_date: "2024-06-21".to_string(),
            sell_price: "0".to_string(),
            profit_loss: "150".to_string(),
        };
        diesel::insert_into(closed_options::table)
            .values(&option)
            .execute(&mut conn)
            .unwrap();

        let stocks: i64 = closed_stocks::table.count().get_result(&mut conn).unwrap();
        let options: i64 = closed_options::table.count().get_result(&mut conn).unwrap();
        assert_eq!(stocks, 1);
        assert_eq!(options, 1);
    }
}
