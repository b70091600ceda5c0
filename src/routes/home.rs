use axum::response::Html;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Landing page", content_type = "text/html")
    ),
    tag = "General"
)]
pub async fn root() -> Html<&'static str> {
    Html(r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <meta name="viewport" content="width=device-width, initial-scale=1.0">
            <title>Realty API</title>
            <style>
                body {
                    display: flex;
                    flex-direction: column;
                    justify-content: center;
                    align-items: center;
                    height: 100vh;
                    margin: 0;
                    font-family: Arial, sans-serif;
                    background-color: #f0f0f0;
                }
                h1 {
                    color: #333;
                }
                p {
                    color: #666;
                }
                ul {
                    list-style: none;
                    padding: 0;
                    display: flex;
                    gap: 16px;
                }
                li a {
                    color: #007bff;
                }
            </style>
        </head>
        <body>
            <h1>Realty API</h1>
            <p>Listings for projects, properties and units, with their agents and media.</p>
            <ul>
                <li><a href="/api/projects">Projects</a></li>
                <li><a href="/api/properties">Properties</a></li>
                <li><a href="/api/sale-units">Units for sale</a></li>
                <li><a href="/api/rent-units">Units for rent</a></li>
                <li><a href="/api/agents">Agents</a></li>
                <li><a href="/api/articles">Articles</a></li>
            </ul>
            <a href="/swagger-ui/" style="
                margin-top: 20px;
                padding: 10px 20px;
                background-color: #007bff;
                color: white;
                text-decoration: none;
                border-radius: 5px;
                font-weight: bold;
                transition: background-color 0.3s;
            " onmouseover="this.style.backgroundColor='#0056b3'" onmouseout="this.style.backgroundColor='#007bff'">
                Explore API Docs
            </a>
        </body>
        </html>
    "#)
}
