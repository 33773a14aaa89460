use yew::prelude::*;
use yew_router::prelude::*;

mod components;
mod pages;
mod services;

use pages::dashboard::DashboardPage;

#[derive(Clone, Routable, PartialEq)]
enum Route {
    #[at("/")]
    Dashboard,
    #[not_found]
    #[at("/404")]
    NotFound,
}

fn switch(routes: Route) -> Html {
    match routes {
        Route::Dashboard => html! { <DashboardPage /> },
        Route::NotFound => html! {
            <div class="min-h-screen flex items-center justify-center">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-white">{"404"}</h1>
                    <p class="text-xl mt-4 text-gray-400">{"Page Not Found"}</p>
                    <Link<Route> to={Route::Dashboard} classes="text-blue-400 hover:underline">
                        {"Back to the dashboard"}
                    </Link<Route>>
                </div>
            </div>
        },
    }
}

#[function_component(App)]
fn app() -> Html {
    html! {
        <BrowserRouter>
            <div class="min-h-screen bg-gray-900">
                <Switch<Route> render={switch} />
            </div>
        </BrowserRouter>
    }
}

fn load_stylesheet(href: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let (Some(head), Ok(link)) = (document.head(), document.create_element("link")) else {
        return;
    };
    if link.set_attribute("href", href).is_ok() && link.set_attribute("rel", "stylesheet").is_ok() {
        let _ = head.append_child(&link);
    }
}

fn main() {
    // Load Tailwind CSS
    load_stylesheet("https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css");

    yew::Renderer::<App>::new().render();
}
