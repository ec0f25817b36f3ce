//! Routes of the `/tours` resource.

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};

use crate::domain::query::{Projection, TourQuery};
use crate::dto::Envelope;
use crate::dto::tours::{PlanData, StatsData, TourData, ToursData, project_tour, project_tours};
use crate::errors::{AppError, run_service};
use crate::forms::tour::{CreateTourForm, UpdateTourForm};
use crate::repository::DieselRepository;
use crate::routes::{tour_id, tour_query};
use crate::services::tours as tours_service;

async fn list(repo: web::Data<DieselRepository>, query: TourQuery) -> Result<HttpResponse, AppError> {
    let projection = query.projection.clone();
    let tours = run_service(move || tours_service::list_tours(repo.get_ref(), &query)).await?;

    let tours = project_tours(&tours, &projection)?;
    Ok(HttpResponse::Ok().json(Envelope::collection(tours.len(), ToursData { tours })))
}

#[get("/tours/top-5-cheap")]
/// Five best rated tours, cheaper first on equal rating.
pub async fn top_cheap_tours(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, AppError> {
    let query = tour_query(&req)?.top_cheap();
    list(repo, query).await
}

#[get("/tours/stats")]
pub async fn tour_stats(repo: web::Data<DieselRepository>) -> Result<HttpResponse, AppError> {
    let stats = run_service(move || tours_service::tour_stats(repo.get_ref())).await?;
    Ok(HttpResponse::Ok().json(Envelope::success(StatsData { stats })))
}

#[get("/tours/monthly-plan/{year}")]
pub async fn monthly_plan(
    path: web::Path<String>,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, AppError> {
    let year = path.into_inner();
    let plan = run_service(move || tours_service::monthly_plan(repo.get_ref(), &year)).await?;
    Ok(HttpResponse::Ok().json(Envelope::success(PlanData { plan })))
}

#[get("/tours")]
pub async fn get_all_tours(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, AppError> {
    let query = tour_query(&req)?;
    list(repo, query).await
}

#[post("/tours")]
pub async fn create_tour(
    repo: web::Data<DieselRepository>,
    form: web::Json<CreateTourForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let tour = run_service(move || tours_service::create_tour(repo.get_ref(), form)).await?;

    let tour = project_tour(&tour, &Projection::Default)?;
    Ok(HttpResponse::Created().json(Envelope::success(TourData { tour })))
}

#[get("/tours/{id}")]
pub async fn get_tour(
    path: web::Path<String>,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, AppError> {
    let id = tour_id(&path)?;
    let tour = run_service(move || tours_service::get_tour(repo.get_ref(), id)).await?;

    let tour = project_tour(&tour, &Projection::Default)?;
    Ok(HttpResponse::Ok().json(Envelope::success(TourData { tour })))
}

#[patch("/tours/{id}")]
pub async fn update_tour(
    path: web::Path<String>,
    repo: web::Data<DieselRepository>,
    form: web::Json<UpdateTourForm>,
) -> Result<HttpResponse, AppError> {
    let id = tour_id(&path)?;
    let form = form.into_inner();
    let tour = run_service(move || tours_service::update_tour(repo.get_ref(), id, form)).await?;

    let tour = project_tour(&tour, &Projection::Default)?;
    Ok(HttpResponse::Ok().json(Envelope::success(TourData { tour })))
}

#[delete("/tours/{id}")]
pub async fn delete_tour(
    path: web::Path<String>,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, AppError> {
    let id = tour_id(&path)?;
    run_service(move || tours_service::delete_tour(repo.get_ref(), id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Registers the tour routes; the literal paths precede `/tours/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(top_cheap_tours)
        .service(tour_stats)
        .service(monthly_plan)
        .service(get_all_tours)
        .service(create_tour)
        .service(get_tour)
        .service(update_tour)
        .service(delete_tour);
}
