// src/services/reviews.rs

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::models::Actor;
use crate::scheduling::appointment::Appointment;
use crate::scheduling::review::{self, Review, ReviewError, ReviewImage};
use crate::store::{self, DocumentStore, Filter, Sort, Write};

use super::ServiceError;

const MAX_FEEDBACK_CHARS: usize = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub appointment_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub feedback: String,
    pub image: Option<ReviewImage>,
}

/// Partial update. `image: null` removes the image, a missing key keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<u8>,
    pub feedback: Option<String>,
    #[serde(default, with = "double_option")]
    pub image: Option<Option<ReviewImage>>,
    pub is_active: Option<bool>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(de).map(Some)
    }
}

fn clean_feedback(feedback: &str) -> Result<String, ServiceError> {
    let feedback = feedback.trim();
    if feedback.chars().count() > MAX_FEEDBACK_CHARS {
        return Err(ServiceError::validation(format!(
            "feedback must be at most {MAX_FEEDBACK_CHARS} characters"
        )));
    }
    Ok(feedback.to_string())
}

async fn load_own_review(store: &dyn DocumentStore, actor: &Actor, id: Uuid) -> Result<Review, ServiceError> {
    let review = store::load::<Review>(store, id)
        .await?
        .ok_or(ServiceError::NotFound("review"))?;
    if review.user_id != actor.id {
        return Err(ServiceError::Forbidden(
            "Only the author can change this review".into(),
        ));
    }
    Ok(review)
}

pub async fn create_review(
    store: &dyn DocumentStore,
    actor: &Actor,
    new: NewReview,
) -> Result<Review, ServiceError> {
    let mut appt = store::load::<Appointment>(store, new.appointment_id)
        .await?
        .ok_or(ServiceError::NotFound("appointment"))?;
    if appt.user_id != actor.id {
        return Err(ServiceError::Forbidden(
            "Only the customer of this appointment can review it".into(),
        ));
    }

    review::check_rating(new.rating)?;
    review::check_reviewable(&appt)?;
    let existing = store::find::<Review>(
        store,
        &Filter::new().eq("appointment_id", json!(appt.id)),
        None,
    )
    .await?;
    if !existing.is_empty() {
        return Err(ReviewError::AlreadyExists.into());
    }

    let now = Utc::now();
    let review = Review {
        id: Uuid::new_v4(),
        user_id: actor.id,
        appointment_id: appt.id,
        admin_id: appt.admin_id,
        rating: new.rating,
        feedback: clean_feedback(&new.feedback)?,
        image: new.image,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let loaded_revision = appt.revision;
    appt.attach_review(review.id, now);

    // a concurrent create may have passed the existence check too
    store
        .transact(vec![
            Write::insert(&review)?,
            Write::replace_if_revision(&appt, loaded_revision)?,
        ])
        .await?;

    tracing::info!(
        review_id = %review.id,
        appointment_id = %appt.id,
        admin_id = %review.admin_id,
        rating = review.rating,
        "review created"
    );
    Ok(review)
}

pub async fn update_review(
    store: &dyn DocumentStore,
    actor: &Actor,
    id: Uuid,
    patch: ReviewPatch,
) -> Result<Review, ServiceError> {
    let mut review = load_own_review(store, actor, id).await?;

    if let Some(rating) = patch.rating {
        review::check_rating(rating)?;
        review.rating = rating;
    }
    if let Some(feedback) = patch.feedback {
        review.feedback = clean_feedback(&feedback)?;
    }
    if let Some(image) = patch.image {
        review.image = image;
    }
    if let Some(is_active) = patch.is_active {
        review.is_active = is_active;
    }
    review.updated_at = Utc::now();

    store::replace(store, &review).await?;
    tracing::info!(review_id = %review.id, "review updated");
    Ok(review)
}

pub async fn delete_review(store: &dyn DocumentStore, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
    let review = load_own_review(store, actor, id).await?;

    let mut writes = vec![Write::delete::<Review>(review.id)];
    if let Some(mut appt) = store::load::<Appointment>(store, review.appointment_id).await? {
        if appt.review == Some(review.id) {
            let loaded_revision = appt.revision;
            appt.detach_review(Utc::now());
            writes.push(Write::replace_if_revision(&appt, loaded_revision)?);
        }
    }
    store.transact(writes).await?;

    tracing::info!(
        review_id = %review.id,
        appointment_id = %review.appointment_id,
        "review deleted"
    );
    Ok(())
}

/// Active reviews, newest first.
pub async fn list_reviews(store: &dyn DocumentStore, admin_id: Option<Uuid>) -> Result<Vec<Review>, ServiceError> {
    let mut filter = Filter::new().eq("is_active", json!(true));
    if let Some(admin_id) = admin_id {
        filter = filter.eq("admin_id", json!(admin_id));
    }
    Ok(store::find::<Review>(store, &filter, Some(Sort::desc("created_at"))).await?)
}
