use crate::modules::common::dto::Pagination;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Select};

/// Runs `query` under the given page/limit, returning the page's rows and the
/// total row count across every page (needed for `PaginationMeta::total`).
pub async fn paginate<E: EntityTrait>(
    query: Select<E>,
    pagination: &Pagination,
    db: &DatabaseConnection,
) -> Result<(Vec<E::Model>, u64), DbErr> {
    let paginator = query.paginate(db, pagination.limit());
    let total = paginator.num_items().await?;
    let data = paginator.fetch_page(pagination.page.max(1) - 1).await?;

    Ok((data, total))
}
