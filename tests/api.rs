mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};

use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tower::ServiceExt;
use uuid::Uuid;

use realty_api::entities::admin::{self, Role};
use realty_api::entities::category;
use realty_api::error::AppError;
use realty_api::routes::create_admin;

use common::{eventually, files_under, png, spawn_app, upload_path, Multipart, TestApp};

fn project_form(title: &str, agent_id: &str) -> Multipart {
    Multipart::default()
        .text("title", title)
        .text("owner", "Emaar")
        .text("city", "Dubai")
        .text("country", "UAE")
        .text("location", "Marina")
        .text("category", "Residential")
        .text("mapUrl", "https://maps.example.com/marina")
        .text("agentId", agent_id)
        .text("offPlan", "true")
        .text("amenities[]", "pool")
        .text("amenities[]", "gym")
}

async fn create_project(app: &TestApp, title: &str, agent_id: &str) -> String {
    let form = project_form(title, agent_id)
        .file("images", "front.png", "image/png", &png())
        .file("pdf", "brochure.pdf", "application/pdf", b"%PDF-1.4 brochure");
    let (status, body) = app.multipart(Method::POST, "/api/projects", form).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], format!("Project '{title}' created!"));
    let (_, found) = app
        .get(&format!("/api/projects/search?title={}", title.replace(' ', "%20")))
        .await;
    found[0]["id"].as_str().unwrap().to_string()
}

fn property_form(listing: &str, agent_id: &str) -> Multipart {
    Multipart::default()
        .text("title", "Marina Heights")
        .text("listing", listing)
        .text("owner", "Damac")
        .text("city", "Dubai")
        .text("country", "UAE")
        .text("location", "Marina")
        .text("type", "Apartment")
        .text("floor", "12")
        .text("area", "1450")
        .text("totalPrice", "2500000")
        .text("bedrooms", "3")
        .text("bathrooms", "2")
        .text("parkingCount", "1")
        .text("mapUrl", "https://maps.example.com/heights")
        .text("description", "Tower with sea views")
        .text("agentId", agent_id)
        .text("views", r#"["sea","city"]"#)
}

async fn create_sale_property(app: &TestApp, agent_id: &str) -> String {
    let form = property_form("sale", agent_id).file("images", "tower.png", "image/png", &png());
    let (status, body) = app.multipart(Method::POST, "/api/properties", form).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    app.single_id("/api/properties").await
}

fn unit_form(title: &str) -> Multipart {
    Multipart::default()
        .text("title", title)
        .text("type", "Apartment")
        .text("unitNo", "1204")
        .text("floor", "12")
        .text("area", "1450")
        .text("pricePerSqft", "1700")
        .text("totalPrice", "2465000")
        .text("rentPrice", "120000")
        .text("bedrooms", "3")
        .text("bathrooms", "2")
        .text("parkingCount", "1")
        .text("description", "Corner unit")
        .text("views[]", "sea")
        .file("images", "unit.png", "image/png", &png())
}

#[tokio::test]
async fn category_titles_are_capitalized_and_unique() {
    let app = spawn_app().await;

    let (status, body) = app
        .json(Method::POST, "/api/categories", json!({ "title": "  luxury villas " }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "message": "Category 'Luxury Villas' created!" }));

    let (status, body) = app
        .json(Method::POST, "/api/categories", json!({ "title": "luxury villas" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "Category already exists!" }));

    let (status, body) = app.get("/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Luxury Villas");
}

#[tokio::test]
async fn search_without_parameters_is_rejected() {
    let app = spawn_app().await;
    app.create_agent("Sara Khan", "sara@realty.test").await;

    let (status, body) = app.get("/api/agents/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No search parameters provided." }));

    let (status, body) = app.get("/api/agents/search?salary=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown search parameter: salary");

    let (status, body) = app.get("/api/agents/search?q=SARA").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["email"], "sara@realty.test");
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let app = spawn_app().await;

    let (status, body) = app
        .get("/api/agents/7b1e4a52-2f4c-4d55-9a59-0c2b8f1d3e11")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Agent not found!" }));

    let (status, body) = app.get("/api/agents/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Agent not found!" }));

    let (status, body) = app.get("/api/agents").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "No agents found!" }));
}

#[tokio::test]
async fn invalid_input_leaves_the_store_untouched() {
    let app = spawn_app().await;

    let (status, body) = app
        .json(Method::POST, "/api/agents", json!({ "name": "No Email" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "email is required!" }));
    let (status, _) = app.get("/api/agents").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let agent_id = app.create_agent("Omar Ali", "omar@realty.test").await;
    let form = project_form("Creek Rise", &agent_id);
    let (status, body) = app.multipart(Method::POST, "/api/projects", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At least one image required!");
    assert!(files_under(app.uploads.path()).is_empty());

    let (status, _) = app.get("/api/projects").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_updates_conflict_without_changes() {
    let app = spawn_app().await;
    app.create_agent("First", "first@realty.test").await;
    let second = app.create_agent("Second", "second@realty.test").await;

    let (status, body) = app
        .json(
            Method::PATCH,
            &format!("/api/agents/{second}"),
            json!({ "name": "Renamed", "email": "FIRST@realty.test" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "Agent already exists!" }));

    let (_, agent) = app.get(&format!("/api/agents/{second}")).await;
    assert_eq!(agent["name"], "Second");
    assert_eq!(agent["email"], "second@realty.test");
}

#[tokio::test]
async fn project_media_follows_the_record() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Lina Haddad", "lina@realty.test").await;
    let project_id = create_project(&app, "Marina Vista", &agent_id).await;

    let gallery_dir = app.uploads.path().join("images/projects").join(&project_id);
    let sheet_dir = app.uploads.path().join("factSheets").join(&project_id);
    assert_eq!(files_under(&gallery_dir).len(), 1);
    assert_eq!(files_under(&sheet_dir).len(), 1);
    assert!(files_under(app.staging.path()).is_empty());

    let (status, project) = app.get(&format!("/api/projects/{project_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let image_url = project["images"][0]["url"].as_str().unwrap().to_string();
    assert!(image_url.starts_with(&format!(
        "http://localhost:3500/uploads/images/projects/{project_id}/"
    )));
    assert!(image_url.ends_with(".webp"));
    assert_eq!(project["agent"]["id"], agent_id.as_str());
    let amenities: Vec<&str> = project["amenities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(amenities, vec!["Pool", "Gym"]);

    // A rename keeps every file where it is.
    let (status, body) = app
        .json(
            Method::PATCH,
            &format!("/api/projects/{project_id}"),
            json!({
                "title": "Marina Vista Phase 2",
                "owner": "Emaar",
                "city": "Dubai",
                "country": "UAE",
                "location": "Marina",
                "category": "Residential",
                "mapUrl": "https://maps.example.com/marina",
                "agentId": agent_id,
                "amenities": ["spa"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Project 'Marina Vista Phase 2' updated!");

    let (_, project) = app.get(&format!("/api/projects/{project_id}")).await;
    assert_eq!(project["title"], "Marina Vista Phase 2");
    assert_eq!(project["images"][0]["url"], image_url.as_str());
    assert_eq!(project["amenities"][0]["title"], "Spa");
    assert_eq!(files_under(&gallery_dir).len(), 1);
    assert_eq!(files_under(&sheet_dir).len(), 1);

    let (status, body) = app.delete(&format!("/api/projects/{project_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project 'Marina Vista Phase 2' deleted!");
    assert!(!gallery_dir.exists());
    assert!(!sheet_dir.exists());

    let (status, body) = app.delete(&format!("/api/projects/{project_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Project not found!" }));
}

#[tokio::test]
async fn agents_with_listings_cannot_be_deleted() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Nadia Aziz", "nadia@realty.test").await;
    let project_id = create_project(&app, "Palm Gardens", &agent_id).await;

    let (status, body) = app.delete(&format!("/api/agents/{agent_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Agent still has 1 project(s)"));
    let (status, _) = app.get(&format!("/api/agents/{agent_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let other = app.create_agent("Karim Saleh", "karim@realty.test").await;
    let (status, _) = app
        .json(
            Method::PATCH,
            &format!("/api/projects/{project_id}/agent"),
            json!({ "agentId": other }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.delete(&format!("/api/agents/{agent_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, project) = app.get(&format!("/api/projects/{project_id}")).await;
    assert_eq!(project["agent"]["id"], other.as_str());
}

#[tokio::test]
async fn installments_are_created_in_one_batch() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Huda Noor", "huda@realty.test").await;
    let project_id = create_project(&app, "Creek Towers", &agent_id).await;
    let uri = format!("/api/projects/{project_id}/installments");
    let plan = json!({
        "installments": [
            { "title": "Booking", "percentage": 10 },
            { "title": "Handover", "percentage": 90 },
        ]
    });

    let (status, body) = app.json(Method::POST, &uri, plan.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "2 installments created!");

    let (status, body) = app.json(Method::POST, &uri, plan).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Installment 'Booking' already exists!");

    let (status, body) = app
        .json(
            Method::POST,
            &uri,
            json!({ "installments": [{ "title": "Bonus", "percentage": 140 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "percentage must be between 0 and 100");

    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, project) = app.get(&format!("/api/projects/{project_id}")).await;
    assert_eq!(project["installments"].as_array().unwrap().len(), 2);

    app.delete(&format!("/api/projects/{project_id}")).await;
    let (status, _) = app.get("/api/installments").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn units_must_match_their_property_listing() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Rami Fares", "rami@realty.test").await;
    let property_id = create_sale_property(&app, &agent_id).await;

    let (status, body) = app
        .multipart(
            Method::POST,
            &format!("/api/properties/{property_id}/rent-units"),
            unit_form("Heights 1204 Rent"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Property 'Marina Heights' is not listed for rent");

    let (status, body) = app
        .multipart(
            Method::POST,
            &format!("/api/properties/{property_id}/sale-units"),
            unit_form("Heights 1204"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Sale unit 'Heights 1204' created!");

    let (status, units) = app.get(&format!("/api/properties/{property_id}/sale-units")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(units[0]["property"]["title"], "Marina Heights");
    assert!(units[0].get("rentPrice").is_none());

    let (status, _) = app.get("/api/rent-units").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/sale-units/search?maxPrice=2000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
    let (status, _) = app.get("/api/sale-units/search?minPrice=2000000&bedrooms=3").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.delete(&format!("/api/properties/{property_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Property still has 1 unit(s)!");
}

#[tokio::test]
async fn favorites_link_users_to_units() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Aisha Omar", "aisha@realty.test").await;
    let property_id = create_sale_property(&app, &agent_id).await;
    let (status, _) = app
        .multipart(
            Method::POST,
            &format!("/api/properties/{property_id}/sale-units"),
            unit_form("Heights 1204"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let unit_id = app.single_id("/api/sale-units").await;

    let (status, user) = app
        .json(
            Method::POST,
            "/api/users",
            json!({ "username": "buyer", "email": "Buyer@Mail.test" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "buyer@mail.test");
    let user_id = user["id"].as_str().unwrap().to_string();
    let favorites = format!("/api/fav/{user_id}/fav-sales");

    let (status, body) = app
        .json(Method::POST, &favorites, json!({ "unitId": unit_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let (status, _) = app
        .json(Method::POST, &favorites, json!({ "unitId": unit_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/fav/{user_id}/fav-rents"),
            json!({ "unitId": unit_id }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Rent unit not found!");

    let (status, body) = app.get(&favorites).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], unit_id.as_str());
    let (status, _) = app.get(&format!("{favorites}/search?q=heights")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/fav/{user_id}/fav-rents")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, user) = app.get(&format!("/api/users/{user_id}")).await;
    assert_eq!(user["favorites"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .json(Method::DELETE, &favorites, json!({ "unitId": unit_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .json(Method::DELETE, &favorites, json!({ "unitId": unit_id }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Favorite not found!");
}

#[tokio::test]
async fn messages_can_be_deleted_in_bulk() {
    let app = spawn_app().await;
    for name in ["Ann", "Ben"] {
        let (status, _) = app
            .json(
                Method::POST,
                "/api/messages",
                json!({ "name": name, "email": "visitor@mail.test", "text": "Call me back" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (_, messages) = app.get("/api/messages").await;
    let ids: Vec<Value> = messages
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].clone())
        .collect();
    assert_eq!(ids.len(), 2);

    let (status, body) = app
        .json(Method::DELETE, "/api/messages", json!({ "ids": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ids are required!");

    let (status, body) = app
        .json(Method::DELETE, "/api/messages", json!({ "ids": ids }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "2 messages deleted!");

    let (status, _) = app.get("/api/messages").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_fall_back_to_not_found() {
    let app = spawn_app().await;
    let (status, body) = app.get("/api/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "404 Not Found" }));

    let (status, body) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/fav/{user_id}/fav-sales").is_some());
}

#[tokio::test]
async fn admin_passwords_are_hashed_and_hidden() {
    let app = spawn_app().await;
    let admin = create_admin(&app.db, "root", "root@realty.test", "s3cret!", Role::Su)
        .await
        .unwrap();
    assert!(admin.password.starts_with("$argon2"));

    let (status, body) = app
        .json(
            Method::POST,
            "/api/admins",
            json!({ "username": "root", "email": "other@realty.test", "password": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Admin already exists!");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/admins",
            json!({ "username": "editor", "email": "editor@realty.test", "password": "pw", "role": "owner" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "role must be either su or admin");

    let (status, body) = app.get(&format!("/api/admins/{}", admin.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "su");
    assert!(body.get("password").is_none());
}

fn property_update(listing: &str, agent_id: &str) -> Value {
    json!({
        "title": "Marina Heights",
        "listing": listing,
        "owner": "Damac",
        "city": "Dubai",
        "country": "UAE",
        "location": "Marina",
        "type": "Apartment",
        "floor": "12",
        "area": 1450,
        "totalPrice": 2500000,
        "bedrooms": 3,
        "bathrooms": 2,
        "parkingCount": 1,
        "mapUrl": "https://maps.example.com/heights",
        "description": "Tower with sea views",
        "agentId": agent_id,
        "views": ["sea"],
    })
}

#[tokio::test]
async fn property_listing_is_locked_while_units_exist() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Rana Said", "rana@realty.test").await;
    let property_id = create_sale_property(&app, &agent_id).await;
    let (status, _) = app
        .multipart(
            Method::POST,
            &format!("/api/properties/{property_id}/sale-units"),
            unit_form("Heights 1204"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let unit_id = app.single_id("/api/sale-units").await;
    let uri = format!("/api/properties/{property_id}");

    let (status, body) = app
        .json(Method::PATCH, &uri, property_update("rent", &agent_id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Property 'Marina Heights' still has 1 sale unit(s)!");
    let (_, property) = app.get(&uri).await;
    assert_eq!(property["listing"], "sale");

    let (status, body) = app
        .json(Method::PATCH, &uri, property_update("sale", &agent_id))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = app.delete(&format!("/api/sale-units/{unit_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .json(Method::PATCH, &uri, property_update("rent", &agent_id))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (_, property) = app.get(&uri).await;
    assert_eq!(property["listing"], "rent");
}

#[tokio::test]
async fn search_treats_like_wildcards_literally() {
    let app = spawn_app().await;
    for title in ["Abc", "A_c", "100% Freehold"] {
        let (status, _) = app
            .json(Method::POST, "/api/categories", json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.get("/api/categories/search?title=a_c").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1, "{body}");
    assert_eq!(body[0]["title"], "A_c");

    let (status, body) = app.get("/api/categories/search?title=0%25%20f").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1, "{body}");

    let (status, _) = app.get("/api/categories/search?title=%25").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/categories/search?title=b_").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/categories/search?q=%5C").await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
}

#[tokio::test]
async fn replaced_project_media_is_collected() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Mona Tariq", "mona@realty.test").await;
    let project_id = create_project(&app, "Harbour Point", &agent_id).await;
    let uri = format!("/api/projects/{project_id}");
    let (_, before) = app.get(&uri).await;
    let old_image = upload_path(&app, before["images"][0]["url"].as_str().unwrap());
    let old_sheet = upload_path(&app, before["pdfUrl"].as_str().unwrap());
    assert!(old_image.exists());
    assert!(old_sheet.exists());

    let form = project_form("Harbour Point", &agent_id)
        .file("images", "pool.png", "image/png", &png())
        .file("images", "lobby.png", "image/png", &png())
        .file("pdf", "brochure-v2.pdf", "application/pdf", b"%PDF-1.4 second edition");
    let (status, body) = app.multipart(Method::PATCH, &uri, form).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, after) = app.get(&uri).await;
    let images = after["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    for image in images {
        assert!(upload_path(&app, image["url"].as_str().unwrap()).exists());
    }
    let new_sheet = upload_path(&app, after["pdfUrl"].as_str().unwrap());
    assert_ne!(new_sheet, old_sheet);
    assert!(new_sheet.exists());

    assert!(eventually(|| !old_image.exists() && !old_sheet.exists()).await);
    let gallery_dir = app.uploads.path().join("images/projects").join(&project_id);
    let sheet_dir = app.uploads.path().join("factSheets").join(&project_id);
    assert_eq!(files_under(&gallery_dir).len(), 2);
    assert_eq!(files_under(&sheet_dir).len(), 1);
    assert!(files_under(app.staging.path()).is_empty());
}

#[tokio::test]
async fn replaced_avatar_is_collected() {
    let app = spawn_app().await;
    let avatar = |form: Multipart| form.file("image", "face.png", "image/png", &png());
    let form = avatar(
        Multipart::default()
            .text("name", "Yara Haddad")
            .text("email", "yara@realty.test"),
    );
    let (status, body) = app.multipart(Method::POST, "/api/agents", form).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let agent_id = app.single_id("/api/agents").await;
    let uri = format!("/api/agents/{agent_id}");
    let (_, agent) = app.get(&uri).await;
    let old_avatar = upload_path(&app, agent["imageUrl"].as_str().unwrap());
    assert!(old_avatar.exists());

    let form = avatar(
        Multipart::default()
            .text("name", "Yara Haddad")
            .text("email", "yara@realty.test"),
    );
    let (status, body) = app.multipart(Method::PATCH, &uri, form).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, agent) = app.get(&uri).await;
    let new_avatar = upload_path(&app, agent["imageUrl"].as_str().unwrap());
    assert!(new_avatar.exists());
    assert!(eventually(|| !old_avatar.exists()).await);
    let avatar_dir = app.uploads.path().join("images/agents").join(&agent_id);
    assert_eq!(files_under(&avatar_dir), vec![new_avatar]);
}

#[tokio::test]
async fn replaced_blueprint_is_collected() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Faris Nasser", "faris@realty.test").await;
    let property_id = create_sale_property(&app, &agent_id).await;
    let uri = format!("/api/properties/{property_id}");
    let blueprint_dir = app.uploads.path().join("images/bluePrints").join(&property_id);

    let form = property_form("sale", &agent_id).file("bluePrint", "plan.png", "image/png", &png());
    let (status, body) = app.multipart(Method::PATCH, &uri, form).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (_, property) = app.get(&uri).await;
    let first = upload_path(&app, property["blueprintUrl"].as_str().unwrap());
    assert_eq!(files_under(&blueprint_dir), vec![first.clone()]);
    assert_eq!(property["images"].as_array().unwrap().len(), 1);

    let form = property_form("sale", &agent_id).file("bluePrint", "plan-v2.png", "image/png", &png());
    let (status, body) = app.multipart(Method::PATCH, &uri, form).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (_, property) = app.get(&uri).await;
    let second = upload_path(&app, property["blueprintUrl"].as_str().unwrap());
    assert_ne!(first, second);
    assert!(eventually(|| !first.exists()).await);
    assert_eq!(files_under(&blueprint_dir), vec![second]);
}

#[tokio::test]
async fn failed_writes_leave_no_staged_files() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Salma Odeh", "salma@realty.test").await;
    let first = create_project(&app, "Palm Crest", &agent_id).await;
    let second = create_project(&app, "Palm Shore", &agent_id).await;
    let mut stored = files_under(app.uploads.path());
    stored.sort();
    assert_eq!(stored.len(), 4);

    let duplicate = project_form("Palm Crest", &agent_id)
        .file("images", "copy.png", "image/png", &png())
        .file("pdf", "copy.pdf", "application/pdf", b"%PDF-1.4 copy");
    let (status, body) = app.multipart(Method::POST, "/api/projects", duplicate).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Project already exists!");

    let rename = project_form("Palm Crest", &agent_id)
        .file("images", "rename.png", "image/png", &png());
    let (status, _) = app
        .multipart(Method::PATCH, &format!("/api/projects/{second}"), rename)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let orphan = project_form("Palm Ridge", &Uuid::new_v4().to_string())
        .file("images", "ridge.png", "image/png", &png());
    let (status, body) = app.multipart(Method::POST, "/api/projects", orphan).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Agent not found!");

    let mut after = files_under(app.uploads.path());
    after.sort();
    assert_eq!(after, stored);
    assert!(files_under(app.staging.path()).is_empty());
    let (_, projects) = app.get("/api/projects").await;
    let ids: Vec<&str> = projects
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.as_str()));
}

#[tokio::test]
async fn uploads_are_served_and_staging_is_not() {
    let app = spawn_app().await;
    let agent_id = app.create_agent("Tala Amin", "tala@realty.test").await;
    let project_id = create_project(&app, "Creek Edge", &agent_id).await;
    let (_, project) = app.get(&format!("/api/projects/{project_id}")).await;
    let url = project["images"][0]["url"].as_str().unwrap();
    let served = url.strip_prefix("http://localhost:3500").unwrap();
    let response = app
        .router
        .clone()
        .oneshot(Request::get(served).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(!app.staging.path().starts_with(app.uploads.path()));
    let entries: Vec<String> = std::fs::read_dir(app.uploads.path())
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(entries.iter().all(|name| !name.starts_with('.')), "{entries:?}");
}

#[tokio::test]
async fn views_and_amenities_can_be_deleted_in_bulk() {
    let app = spawn_app().await;
    for (uri, title) in [
        ("/api/views", "sea"),
        ("/api/views", "golf course"),
        ("/api/views", "skyline"),
        ("/api/amenities", "pool"),
    ] {
        let (status, _) = app.json(Method::POST, uri, json!({ "title": title })).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (_, views) = app.get("/api/views/search?q=s").await;
    let ids: Vec<Value> = views
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].clone())
        .collect();
    assert_eq!(ids.len(), 3);
    let sea = app.single_id("/api/views/search?title=sea").await;

    let (status, body) = app
        .json(
            Method::DELETE,
            "/api/views",
            json!({ "ids": [sea, Uuid::new_v4().to_string(), "garbage"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "1 views deleted!");
    let (_, views) = app.get("/api/views").await;
    let titles: Vec<&str> = views
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(!titles.contains(&"Sea"));

    let (status, body) = app
        .json(
            Method::DELETE,
            "/api/amenities",
            json!({ "ids": [Uuid::new_v4().to_string()] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No amenities found!");

    let pool = app.single_id("/api/amenities").await;
    let (status, body) = app
        .json(Method::DELETE, "/api/amenities", json!({ "ids": [pool] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "1 amenities deleted!");
    let (status, _) = app.get("/api/amenities").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unique_violations_map_to_conflict() {
    let app = spawn_app().await;
    let row = |title: &str| {
        let now = chrono::Utc::now().naive_utc();
        category::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
    };
    row("Townhouses").insert(&app.db).await.unwrap();
    let err = row("Townhouses").insert(&app.db).await.unwrap_err();

    match AppError::from_db(err, "Category") {
        AppError::Conflict(message) => assert_eq!(message, "Category already exists!"),
        other => panic!("expected a conflict, got {other:?}"),
    }
    let (_, categories) = app.get("/api/categories").await;
    assert_eq!(categories.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn articles_and_types_can_be_updated() {
    let app = spawn_app().await;
    let (status, _) = app
        .json(
            Method::POST,
            "/api/articles",
            json!({ "title": "Buying off-plan", "description": "A primer", "body": "Start here." }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let article_id = app.single_id("/api/articles").await;
    let uri = format!("/api/articles/{article_id}");
    let (status, body) = app
        .json(
            Method::PATCH,
            &uri,
            json!({ "title": "Buying off-plan in 2026", "description": "A primer", "body": "Updated." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Article 'Buying off-plan in 2026' updated!");
    let (_, article) = app.get(&uri).await;
    assert_eq!(article["body"], "Updated.");

    let (status, body) = app
        .json(Method::PATCH, &uri, json!({ "title": "No body", "description": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "body is required!");

    for title in ["villa", "studio"] {
        let (status, _) = app.json(Method::POST, "/api/types", json!({ "title": title })).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let studio = app.single_id("/api/types/search?title=studio").await;
    let uri = format!("/api/types/{studio}");
    let (status, body) = app.json(Method::PATCH, &uri, json!({ "title": "penthouse" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Type 'Penthouse' updated!");
    let (status, body) = app.json(Method::PATCH, &uri, json!({ "title": "VILLA" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Type already exists!");
    let (_, found) = app.get(&uri).await;
    assert_eq!(found["title"], "Penthouse");
}

#[tokio::test]
async fn admins_can_be_updated_without_a_new_password() {
    let app = spawn_app().await;
    let admin = create_admin(&app.db, "ops", "ops@realty.test", "first-pass", Role::Su)
        .await
        .unwrap();
    let uri = format!("/api/admins/{}", admin.id);

    let (status, body) = app
        .json(
            Method::PATCH,
            &uri,
            json!({ "username": "operations", "email": "OPS@realty.test", "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Admin 'operations' updated!");
    let stored = admin::Entity::find_by_id(admin.id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.email, "ops@realty.test");
    assert_eq!(stored.role, Role::Admin);
    assert_eq!(stored.password, admin.password);

    let (status, _) = app
        .json(
            Method::PATCH,
            &uri,
            json!({ "username": "operations", "email": "ops@realty.test", "password": "second-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let stored = admin::Entity::find_by_id(admin.id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password, admin.password);
    assert!(stored.password.starts_with("$argon2"));
}

#[tokio::test]
async fn landing_page_links_the_listings() {
    let app = spawn_app().await;
    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    let html = body.as_str().unwrap();
    assert!(html.contains(r#"href="/api/projects""#));
    assert!(html.contains(r#"href="/api/properties""#));
}
