mod common;

use sea_orm::EntityTrait;

use common::*;
use ride_hailing_backend::AppError;
use ride_hailing_backend::entities::captain::{CaptainStatus, VehicleType};
use ride_hailing_backend::entities::ride::{self, RideStatus};
use ride_hailing_backend::services::{Dispatcher, RideEvent};

async fn stored(app: &TestApp, id: uuid::Uuid) -> ride::Model {
    ride::Entity::find_by_id(id)
        .one(&app.db)
        .await
        .unwrap()
        .expect("ride exists")
}

#[tokio::test]
async fn test_create_ride_is_pending_with_fresh_otp() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();

    assert_eq!(ride.status, RideStatus::Pending);
    assert_eq!(ride.captain_id, None);
    assert_eq!(ride.otp.len(), 6);
    assert!(ride.otp.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(ride.distance, Some(1250));
    assert_eq!(ride.duration, Some(60));

    let json = serde_json::to_value(&ride).unwrap();
    assert!(json.get("otp").is_none());
}

#[tokio::test]
async fn test_create_ride_fare_matches_quote_for_each_vehicle() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;

    let table = app
        .state
        .rides
        .fares()
        .get_fare(PICKUP, DESTINATION)
        .await
        .unwrap();
    assert_eq!((table.auto, table.car, table.bike), (45, 71, 32));

    for vehicle_type in [VehicleType::Auto, VehicleType::Car, VehicleType::Bike] {
        let ride = app
            .state
            .rides
            .create_ride(rider.id, PICKUP, DESTINATION, vehicle_type)
            .await
            .unwrap();
        assert_eq!(ride.fare, table.for_vehicle(vehicle_type));
    }
}

#[tokio::test]
async fn test_create_ride_requires_addresses() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;

    let err = app
        .state
        .rides
        .create_ride(rider.id, "", DESTINATION, VehicleType::Car)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_full_lifecycle() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let captain = seed_captain(
        &app.db,
        "ravi@example.com",
        CaptainStatus::Active,
        VehicleType::Car,
        PICKUP_POINT,
    )
    .await;
    let mut rider_events = app.notifier.subscribe(rider.id);

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();
    let otp = stored(&app, ride.id).await.otp;

    let confirmed = app.state.rides.confirm_ride(ride.id, captain.id).await.unwrap();
    assert_eq!(confirmed.ride.status, RideStatus::Accepted);
    assert_eq!(confirmed.ride.captain_id, Some(captain.id));
    assert_eq!(confirmed.otp, otp);
    assert_eq!(confirmed.rider.id, rider.id);
    assert_eq!(confirmed.captain.as_ref().map(|c| c.id), Some(captain.id));

    let event = rider_events.try_recv().unwrap();
    assert_eq!(event.event, RideEvent::RideConfirmed);
    assert_eq!(event.data["otp"], otp.as_str());

    let started = app
        .state
        .rides
        .start_ride(ride.id, &otp, captain.id)
        .await
        .unwrap();
    assert_eq!(started.ride.status, RideStatus::Ongoing);
    assert_eq!(rider_events.try_recv().unwrap().event, RideEvent::RideStarted);

    let ended = app.state.rides.end_ride(ride.id, captain.id).await.unwrap();
    assert_eq!(ended.ride.status, RideStatus::Completed);
    assert_eq!(ended.ride.fare, ride.fare);
    assert_eq!(rider_events.try_recv().unwrap().event, RideEvent::RideEnded);

    assert_eq!(stored(&app, ride.id).await.status, RideStatus::Completed);
}

#[tokio::test]
async fn test_second_confirm_is_rejected() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let first = seed_captain(&app.db, "first@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;
    let second = seed_captain(&app.db, "second@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();

    app.state.rides.confirm_ride(ride.id, first.id).await.unwrap();
    let err = app.state.rides.confirm_ride(ride.id, second.id).await.unwrap_err();

    match err {
        AppError::InvalidState(message) => assert!(message.contains("already been accepted"), "{}", message),
        other => panic!("expected InvalidState, got {:?}", other),
    }
    assert_eq!(stored(&app, ride.id).await.captain_id, Some(first.id));
}

#[tokio::test]
async fn test_confirm_unknown_ride_is_not_found() {
    let app = setup().await;
    let captain = seed_captain(&app.db, "ravi@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;

    let err = app
        .state
        .rides
        .confirm_ride(uuid::Uuid::new_v4(), captain.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_start_requires_accepted_even_with_correct_otp() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let captain = seed_captain(&app.db, "ravi@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();
    let otp = stored(&app, ride.id).await.otp;

    let err = app
        .state
        .rides
        .start_ride(ride.id, &otp, captain.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(stored(&app, ride.id).await.status, RideStatus::Pending);
}

#[tokio::test]
async fn test_start_with_wrong_otp_keeps_ride_accepted() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let captain = seed_captain(&app.db, "ravi@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();
    app.state.rides.confirm_ride(ride.id, captain.id).await.unwrap();

    let otp = stored(&app, ride.id).await.otp;
    let wrong = if otp == "000000" { "111111" } else { "000000" };

    let err = app
        .state
        .rides
        .start_ride(ride.id, wrong, captain.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidOtp));
    assert_eq!(stored(&app, ride.id).await.status, RideStatus::Accepted);

    let err = app.state.rides.start_ride(ride.id, "", captain.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_end_by_other_captain_is_not_found() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let captain = seed_captain(&app.db, "ravi@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;
    let other = seed_captain(&app.db, "other@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();
    app.state.rides.confirm_ride(ride.id, captain.id).await.unwrap();
    let otp = stored(&app, ride.id).await.otp;
    app.state.rides.start_ride(ride.id, &otp, captain.id).await.unwrap();

    let err = app.state.rides.end_ride(ride.id, other.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(stored(&app, ride.id).await.status, RideStatus::Ongoing);
}

#[tokio::test]
async fn test_end_requires_ongoing() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let captain = seed_captain(&app.db, "ravi@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();
    app.state.rides.confirm_ride(ride.id, captain.id).await.unwrap();

    let err = app.state.rides.end_ride(ride.id, captain.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn test_cancel_accepted_ride_notifies_captain() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let captain = seed_captain(&app.db, "ravi@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;
    let mut captain_events = app.notifier.subscribe(captain.id);

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();
    app.state.rides.confirm_ride(ride.id, captain.id).await.unwrap();

    let cancelled = app.state.rides.cancel_ride(ride.id, rider.id).await.unwrap();
    assert_eq!(cancelled.status, RideStatus::Cancelled);
    assert_eq!(captain_events.try_recv().unwrap().event, RideEvent::RideCancelled);

    // Terminal: nothing moves it any more
    let err = app.state.rides.cancel_ride(ride.id, rider.id).await.unwrap_err();
    assert!(matches!(&err, AppError::InvalidState(m) if m.contains("Cancelled")), "{:?}", err);
    let err = app.state.rides.confirm_ride(ride.id, captain.id).await.unwrap_err();
    assert!(matches!(&err, AppError::InvalidState(m) if m.contains("Cancelled")), "{:?}", err);
}

#[tokio::test]
async fn test_cancel_ongoing_ride_is_rejected() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let captain = seed_captain(&app.db, "ravi@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();
    app.state.rides.confirm_ride(ride.id, captain.id).await.unwrap();
    let otp = stored(&app, ride.id).await.otp;
    app.state.rides.start_ride(ride.id, &otp, captain.id).await.unwrap();

    let err = app.state.rides.cancel_ride(ride.id, rider.id).await.unwrap_err();
    assert!(matches!(&err, AppError::InvalidState(m) if m.contains("already started")), "{:?}", err);
    assert_eq!(stored(&app, ride.id).await.status, RideStatus::Ongoing);
}

#[tokio::test]
async fn test_cancel_by_other_rider_is_not_found() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let other = seed_rider(&app.db, "other@example.com").await;

    let ride = app
        .state
        .rides
        .create_ride(rider.id, PICKUP, DESTINATION, VehicleType::Auto)
        .await
        .unwrap();

    let err = app.state.rides.cancel_ride(ride.id, other.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_dispatch_offers_ride_to_nearby_matching_captains() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;

    let near = seed_captain(&app.db, "near@example.com", CaptainStatus::Active, VehicleType::Car, north_of(PICKUP_POINT, 1.0)).await;
    let far = seed_captain(&app.db, "far@example.com", CaptainStatus::Active, VehicleType::Car, north_of(PICKUP_POINT, 20.0)).await;
    let off_duty = seed_captain(&app.db, "off@example.com", CaptainStatus::Inactive, VehicleType::Car, PICKUP_POINT).await;
    let bike = seed_captain(&app.db, "bike@example.com", CaptainStatus::Active, VehicleType::Bike, PICKUP_POINT).await;

    let mut near_rx = app.notifier.subscribe(near.id);
    let mut far_rx = app.notifier.subscribe(far.id);
    let mut off_rx = app.notifier.subscribe(off_duty.id);
    let mut bike_rx = app.notifier.subscribe(bike.id);

    let ride = app
        .state
        .dispatcher
        .request_ride(&app.state.rides, rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();

    let offer = near_rx.try_recv().unwrap();
    assert_eq!(offer.event, RideEvent::NewRide);
    assert_eq!(offer.data["id"], ride.id.to_string());
    assert_eq!(offer.data["rider"]["id"], rider.id.to_string());
    assert!(offer.data.get("otp").is_none());

    assert!(far_rx.try_recv().is_err());
    assert!(off_rx.try_recv().is_err());
    assert!(bike_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_dispatch_unknown_pickup_creates_nothing() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;

    let err = app
        .state
        .dispatcher
        .request_ride(&app.state.rides, rider.id, UNKNOWN, DESTINATION, VehicleType::Car)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let rides = ride::Entity::find().all(&app.db).await.unwrap();
    assert!(rides.is_empty());
}

#[tokio::test]
async fn test_dispatch_failure_still_returns_created_ride() {
    let app = setup().await;
    let rider = seed_rider(&app.db, "asha@example.com").await;
    let captain = seed_captain(&app.db, "ravi@example.com", CaptainStatus::Active, VehicleType::Car, PICKUP_POINT).await;
    let mut captain_rx = app.notifier.subscribe(captain.id);

    // A negative radius makes the captain lookup fail after the ride is written
    let dispatcher = Dispatcher::new(app.db.clone(), app.geocoder.clone(), app.notifier.clone(), -1.0);

    let ride = dispatcher
        .request_ride(&app.state.rides, rider.id, PICKUP, DESTINATION, VehicleType::Car)
        .await
        .unwrap();

    assert_eq!(ride.status, RideStatus::Pending);
    assert_eq!(stored(&app, ride.id).await.rider_id, rider.id);
    assert!(captain_rx.try_recv().is_err());

    // The rider can still back out of the unoffered ride
    let cancelled = app.state.rides.cancel_ride(ride.id, rider.id).await.unwrap();
    assert_eq!(cancelled.status, RideStatus::Cancelled);
}
