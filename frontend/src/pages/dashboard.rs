use yew::prelude::*;
use crate::components::Dashboard;

/// Landing page: the pipeline dashboard under a slim top bar.
#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    html! {
        <>
            <nav class="bg-gray-800 border-b border-gray-700 px-6 py-3">
                <span class="text-white font-semibold">{"Sales Pipeline"}</span>
            </nav>
            <main class="max-w-screen-2xl mx-auto">
                <Dashboard />
            </main>
        </>
    }
}
